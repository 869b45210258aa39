use core::{
  sync::atomic::{AtomicBool, Ordering},
  time::Duration,
};
use std::{
  collections::BTreeMap,
  sync::{Condvar, Mutex},
  thread,
};

use takt_utils_rs::{
  sync::ArcShared,
  time::{Clock, SystemClock},
};

use super::{ScheduleHandle, ScheduledItem, SchedulerRunnable};
use crate::{dispatcher::DispatcherRef, support};

#[cfg(test)]
mod tests;

const LOG_TARGET: &str = "takt::dispatch::scheduler";

type TimeIndex = BTreeMap<u64, Vec<ScheduleHandle>>;

/// Shared handle to a [`Scheduler`].
pub type SchedulerRef = ArcShared<Scheduler>;

/// Background thread maintaining a time-ordered set of pending actions.
///
/// One instance (and thus one thread) serves the whole process. Fired actions
/// are never executed on the scheduler thread itself: each one is handed to
/// the dispatcher installed *at fire time*, so re-initializing the dispatcher
/// retargets deliveries that are already scheduled.
pub struct Scheduler {
  core:   ArcShared<SchedulerCore>,
  worker: Mutex<Option<thread::JoinHandle<()>>>,
}

struct SchedulerCore {
  index:      Mutex<TimeIndex>,
  wakeup:     Condvar,
  running:    AtomicBool,
  clock:      ArcShared<dyn Clock>,
  dispatcher: DispatcherRef,
}

impl SchedulerCore {
  fn run_loop(&self) {
    let mut index = support::lock(&self.index);
    while self.running.load(Ordering::Acquire) {
      let earliest = index.keys().next().copied();
      match earliest {
        | None => {
          index = support::wait(&self.wakeup, index);
        },
        | Some(when) => {
          let now = self.clock.now_millis();
          if when > now {
            index = support::wait_timeout(&self.wakeup, index, Duration::from_millis(when - now));
            // Re-evaluate from scratch: the index may have mutated while we
            // slept, including spurious wakes.
            continue;
          }
          let item = pop_first(&mut index, when);
          drop(index);
          if let Some(item) = item {
            self.fire(item);
          }
          index = support::lock(&self.index);
        },
      }
    }
    tracing::debug!(target: LOG_TARGET, "scheduler thread terminated");
  }

  /// Removes the item from its bucket before execution and hands it to the
  /// dispatch thread.
  fn fire(&self, item: ScheduleHandle) {
    if !item.mark_fired() {
      // Lost to a cancel that arrived while the item was still indexed.
      return;
    }
    let delivery = item.clone();
    if self.dispatcher.dispatch(move || delivery.run()).is_err() {
      tracing::warn!(
        target: LOG_TARGET,
        when_millis = item.scheduled_time_millis(),
        "dropping fired item: dispatcher is not initialized"
      );
    }
  }
}

/// Pops the oldest entry of the given bucket, dropping the bucket once empty.
fn pop_first(index: &mut TimeIndex, when: u64) -> Option<ScheduleHandle> {
  let bucket = index.get_mut(&when)?;
  let item = if bucket.is_empty() { None } else { Some(bucket.remove(0)) };
  if bucket.is_empty() {
    index.remove(&when);
  }
  item
}

fn remove_from_bucket(index: &mut TimeIndex, handle: &ScheduleHandle) {
  let when = handle.scheduled_time_millis();
  if let Some(bucket) = index.get_mut(&when) {
    bucket.retain(|entry| !entry.ptr_eq(handle));
    if bucket.is_empty() {
      index.remove(&when);
    }
  }
}

impl Scheduler {
  /// Creates a scheduler over the wall clock and spawns its thread.
  ///
  /// # Panics
  ///
  /// Panics when the OS refuses to spawn the scheduler thread.
  #[must_use]
  pub fn new(dispatcher: DispatcherRef) -> Self {
    Self::with_clock(dispatcher, ArcShared::from_arc(std::sync::Arc::new(SystemClock) as std::sync::Arc<dyn Clock>))
  }

  /// Creates a scheduler over the provided clock and spawns its thread.
  ///
  /// # Panics
  ///
  /// Panics when the OS refuses to spawn the scheduler thread.
  #[must_use]
  pub fn with_clock(dispatcher: DispatcherRef, clock: ArcShared<dyn Clock>) -> Self {
    let core = ArcShared::new(SchedulerCore {
      index: Mutex::new(TimeIndex::new()),
      wakeup: Condvar::new(),
      running: AtomicBool::new(true),
      clock,
      dispatcher,
    });
    let loop_core = core.clone();
    let handle = thread::Builder::new()
      .name(String::from("takt-scheduler"))
      .spawn(move || loop_core.run_loop())
      .unwrap_or_else(|error| panic!("failed to spawn scheduler thread: {error}"));
    Self { core, worker: Mutex::new(Some(handle)) }
  }

  /// Creates a shared scheduler handle over the wall clock.
  #[must_use]
  pub fn new_ref(dispatcher: DispatcherRef) -> SchedulerRef {
    ArcShared::new(Self::new(dispatcher))
  }

  /// Returns the clock the scheduler computes deadlines with.
  #[must_use]
  pub fn clock(&self) -> ArcShared<dyn Clock> {
    self.core.clock.clone()
  }

  /// Schedules a closure for the given epoch-millisecond time.
  pub fn schedule(&self, action: impl Fn() + Send + Sync + 'static, when_millis: u64) -> ScheduleHandle {
    self.schedule_runnable(ArcShared::from_arc(std::sync::Arc::new(action) as std::sync::Arc<dyn SchedulerRunnable>), when_millis)
  }

  /// Schedules a runnable for the given epoch-millisecond time.
  ///
  /// The scheduler thread is woken only when the entry becomes the new
  /// earliest one.
  pub fn schedule_runnable(&self, runnable: ArcShared<dyn SchedulerRunnable>, when_millis: u64) -> ScheduleHandle {
    let handle = ArcShared::new(ScheduledItem::new(runnable, when_millis));
    let mut index = support::lock(&self.core.index);
    let is_new_earliest = index.keys().next().map_or(true, |&earliest| when_millis < earliest);
    index.entry(when_millis).or_default().push(handle.clone());
    if is_new_earliest {
      self.core.wakeup.notify_all();
    }
    handle
  }

  /// Cancels the entry; idempotent and safe to call after firing.
  pub fn cancel(&self, handle: &ScheduleHandle) {
    if handle.mark_cancelled() {
      let mut index = support::lock(&self.core.index);
      remove_from_bucket(&mut index, handle);
    }
  }

  /// Moves a pending entry to a new firing time under one critical section.
  ///
  /// No-op when the entry already fired, was cancelled, or is set to the
  /// requested time already.
  pub fn reschedule(&self, handle: &ScheduleHandle, when_millis: u64) {
    let mut index = support::lock(&self.core.index);
    if !handle.is_pending() || handle.scheduled_time_millis() == when_millis {
      return;
    }
    remove_from_bucket(&mut index, handle);
    handle.set_scheduled_time_millis(when_millis);
    let is_new_earliest = index.keys().next().map_or(true, |&earliest| when_millis < earliest);
    index.entry(when_millis).or_default().push(handle.clone());
    if is_new_earliest {
      self.core.wakeup.notify_all();
    }
  }

  /// Stops the thread and joins it; pending entries are dropped.
  pub fn dispose(&self) {
    self.core.running.store(false, Ordering::Release);
    {
      let _index = support::lock(&self.core.index);
      self.core.wakeup.notify_all();
    }
    let handle = support::lock(&self.worker).take();
    if let Some(handle) = handle {
      if handle.join().is_err() {
        tracing::warn!(target: LOG_TARGET, "scheduler thread panicked during shutdown");
      }
    }
  }
}

impl Drop for Scheduler {
  fn drop(&mut self) {
    self.dispose();
  }
}
