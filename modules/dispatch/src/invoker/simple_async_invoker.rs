use core::{
  sync::atomic::{AtomicBool, Ordering},
  time::Duration,
};
use std::{
  collections::VecDeque,
  sync::{Arc, Condvar, Mutex},
  thread,
  thread::ThreadId,
};

use takt_utils_rs::{concurrent::CountDownLatch, sync::ArcShared};

use super::{AsyncInvoker, InvokeItem, InvokerConfig, InvokerRef, InvokerTask};
use crate::{
  failure::{DispatchFailure, FailureOrigin, FailurePayload, FailureSink},
  support,
};


const LOG_TARGET: &str = "takt::dispatch::invoker";

/// How long a blocking foreign-thread `yield_once(true)` sleeps.
const YIELD_SLEEP: Duration = Duration::from_millis(1);

/// FIFO single-consumer invoker backed by one dedicated worker thread.
///
/// See [`AsyncInvoker`] for the contract. Reentrant progress is provided by
/// [`AsyncInvoker::yield_once`]: on the worker thread it pops and runs one
/// queued item in place, which is what lets nested `call`/`dispatch` from
/// inside a running task make progress instead of deadlocking, at the cost of
/// violating strict FIFO for that nested execution.
pub struct SimpleAsyncInvoker {
  core:   ArcShared<InvokerCore>,
  worker: Mutex<Option<thread::JoinHandle<()>>>,
}

struct InvokerCore {
  name:      String,
  queue:     Mutex<VecDeque<ArcShared<InvokeItem>>>,
  available: Condvar,
  running:   AtomicBool,
  disposed:  AtomicBool,
  worker_id: Mutex<Option<ThreadId>>,
  sink:      ArcShared<dyn FailureSink>,
}

impl InvokerCore {
  fn is_worker_thread(&self) -> bool {
    *support::lock(&self.worker_id) == Some(thread::current().id())
  }

  fn run_item(&self, item: &InvokeItem) {
    if let Some(payload) = item.run() {
      let origin = if item.is_awaited() { FailureOrigin::BlockingCall } else { FailureOrigin::DispatchTask };
      self.sink.on_failure(DispatchFailure::new(origin, payload));
    }
    // The blocked caller may dispose the invoker the moment it resumes, so
    // the sink must have observed the failure first.
    item.finish();
  }

  fn worker_loop(&self) {
    loop {
      let next = {
        let mut queue = support::lock(&self.queue);
        loop {
          if let Some(item) = queue.pop_front() {
            break Some(item);
          }
          if !self.running.load(Ordering::Acquire) {
            break None;
          }
          queue = support::wait(&self.available, queue);
        }
      };
      match next {
        | Some(item) => self.run_item(&item),
        | None => break,
      }
    }
    tracing::debug!(target: LOG_TARGET, invoker = %self.name, "worker thread terminated");
  }

  /// Enqueues unless disposed; returns whether the item was accepted.
  fn enqueue(&self, item: ArcShared<InvokeItem>) -> bool {
    if !self.running.load(Ordering::Acquire) {
      tracing::warn!(target: LOG_TARGET, invoker = %self.name, "task submitted after dispose was dropped");
      return false;
    }
    let mut queue = support::lock(&self.queue);
    queue.push_back(item);
    self.available.notify_one();
    true
  }
}

impl SimpleAsyncInvoker {
  /// Spawns the worker thread and returns the invoker.
  ///
  /// # Panics
  ///
  /// Panics when the OS refuses to spawn the worker thread.
  #[must_use]
  pub fn new(config: InvokerConfig) -> Self {
    let core = ArcShared::new(InvokerCore {
      name:      config.name().to_owned(),
      queue:     Mutex::new(VecDeque::new()),
      available: Condvar::new(),
      running:   AtomicBool::new(true),
      disposed:  AtomicBool::new(false),
      worker_id: Mutex::new(None),
      sink:      config.sink(),
    });

    let loop_core = core.clone();
    let handle = thread::Builder::new()
      .name(config.name().to_owned())
      .spawn(move || loop_core.worker_loop())
      .unwrap_or_else(|error| panic!("failed to spawn invoker worker thread: {error}"));
    *support::lock(&core.worker_id) = Some(handle.thread().id());

    Self { core, worker: Mutex::new(Some(handle)) }
  }

  /// Erases the concrete type into an installable invoker handle.
  #[must_use]
  pub fn into_ref(self) -> InvokerRef {
    ArcShared::from_arc(Arc::new(self) as Arc<dyn AsyncInvoker>)
  }
}

impl AsyncInvoker for SimpleAsyncInvoker {
  fn dispatch(&self, task: InvokerTask) {
    let _ = self.core.enqueue(ArcShared::new(InvokeItem::fire(task)));
  }

  fn call(&self, task: InvokerTask) -> Result<(), FailurePayload> {
    let item = ArcShared::new(InvokeItem::awaited(task));
    if !self.core.enqueue(item.clone()) {
      return Err(FailurePayload::from_message("call on a disposed invoker"));
    }

    if self.is_dispatch_thread() {
      // Reentrant call: drain the queue in place until our own item ran.
      while !item.is_complete() {
        let _ = self.yield_once(false);
      }
    } else {
      item.wait();
    }

    match item.take_failure() {
      | Some(payload) => Err(payload),
      | None => Ok(()),
    }
  }

  fn is_dispatch_thread(&self) -> bool {
    self.core.is_worker_thread()
  }

  fn yield_once(&self, block: bool) -> bool {
    if self.core.is_worker_thread() {
      let next = support::lock(&self.core.queue).pop_front();
      match next {
        | Some(item) => {
          self.core.run_item(&item);
          true
        },
        | None => false,
      }
    } else {
      if block {
        thread::sleep(YIELD_SLEEP);
      } else {
        thread::yield_now();
      }
      false
    }
  }

  fn flush(&self) {
    if !self.core.running.load(Ordering::Acquire) {
      return;
    }
    if self.is_dispatch_thread() {
      while self.yield_once(false) {}
      return;
    }
    // A sentinel behind everything currently enqueued; FIFO guarantees the
    // queue content present at submission time drained once it fires.
    let latch = ArcShared::new(CountDownLatch::new(1));
    let opened = latch.clone();
    if self.core.enqueue(ArcShared::new(InvokeItem::fire(Box::new(move || opened.count_down())))) {
      latch.wait();
    }
  }

  fn dispose(&self) {
    if self.core.disposed.swap(true, Ordering::AcqRel) {
      return;
    }
    self.flush();
    self.core.running.store(false, Ordering::Release);
    {
      let _queue = support::lock(&self.core.queue);
      self.core.available.notify_all();
    }
    let handle = support::lock(&self.worker).take();
    if let Some(handle) = handle {
      if self.is_dispatch_thread() {
        // Disposing from the worker itself: the loop exits on its own once
        // the current task returns; joining here would deadlock.
        drop(handle);
      } else if handle.join().is_err() {
        tracing::warn!(target: LOG_TARGET, invoker = %self.core.name, "worker thread panicked during shutdown");
      }
    }
    tracing::debug!(target: LOG_TARGET, invoker = %self.core.name, "invoker disposed");
  }
}

impl Drop for SimpleAsyncInvoker {
  fn drop(&mut self) {
    self.dispose();
  }
}
