use std::sync::Mutex;

use takt_utils_rs::sync::ArcShared;

use crate::{failure::FailurePayload, support};

/// Task executed on the dispatch thread.
pub type InvokerTask = Box<dyn FnOnce() + Send + 'static>;

/// Shared handle to an installed invoker.
pub type InvokerRef = ArcShared<dyn AsyncInvoker>;

/// Single-consumer executor contract.
///
/// Implementations own one logical dispatch thread. Work submitted from other
/// threads runs in strict FIFO submission order; work submitted from within a
/// running task may run out of order relative to the outer queue (the
/// documented reentrant exception to FIFO, see [`AsyncInvoker::yield_once`]).
pub trait AsyncInvoker: Send + Sync + 'static {
  /// Enqueues the task and returns immediately.
  fn dispatch(&self, task: InvokerTask);

  /// Enqueues the task and blocks the caller until it completed or panicked.
  ///
  /// Invoked from the dispatch thread itself this must not deadlock: the
  /// implementation drains the queue recursively until the task completes.
  ///
  /// # Errors
  ///
  /// Returns the task's panic payload when the task panicked, or a synthetic
  /// payload when the invoker is already disposed.
  fn call(&self, task: InvokerTask) -> Result<(), FailurePayload>;

  /// Returns whether the calling thread is the dispatch thread.
  fn is_dispatch_thread(&self) -> bool;

  /// On the dispatch thread: runs at most one pending task and reports
  /// whether one ran. On any other thread: yields the OS thread
  /// (`block == false`) or sleeps briefly (`block == true`) without touching
  /// the queue, and returns `false`.
  fn yield_once(&self, block: bool) -> bool;

  /// Best-effort drain of everything enqueued at the time of the call.
  ///
  /// Work submitted concurrently while the flush is in progress is not
  /// guaranteed to be drained by the same call.
  fn flush(&self);

  /// Flushes, then terminates the worker. No further calls are valid.
  fn dispose(&self);
}

/// Runs a value-producing action through [`AsyncInvoker::call`].
///
/// The value is carried back through a shared slot so the trait itself stays
/// object safe.
///
/// # Errors
///
/// Returns the action's panic payload when it panicked.
pub fn call_with<R, F>(invoker: &dyn AsyncInvoker, action: F) -> Result<R, FailurePayload>
where
  R: Send + 'static,
  F: FnOnce() -> R + Send + 'static, {
  let slot: ArcShared<Mutex<Option<R>>> = ArcShared::new(Mutex::new(None));
  let writer = slot.clone();
  invoker.call(Box::new(move || {
    let value = action();
    *support::lock(&writer) = Some(value);
  }))?;
  let value = support::lock(&slot).take();
  match value {
    | Some(value) => Ok(value),
    | None => Err(FailurePayload::from_message("call completed without producing a value")),
  }
}
