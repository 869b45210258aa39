use core::time::Duration;
use std::{sync::Mutex, thread, thread::JoinHandle};

use takt_utils_rs::sync::ArcShared;

use super::DispatcherError;
use crate::{
  failure::FailurePayload,
  invoker::{InvokerRef, call_with},
  support,
};


const LOG_TARGET: &str = "takt::dispatch::dispatcher";

/// How long [`Dispatcher::join`] sleeps between queue-service rounds.
const JOIN_POLL: Duration = Duration::from_millis(1);

/// Facade holding the process's *current* invoker.
///
/// Every other component routes dispatch-thread work through this type
/// instead of holding an invoker reference directly, so re-initializing the
/// dispatcher retargets all of them at once. The lifecycle is explicit:
/// construct once, [`init`](Self::init), optionally re-`init`, and
/// [`dispose`](Self::dispose); there is no lazy re-creation after disposal.
pub struct Dispatcher {
  current: Mutex<Option<InvokerRef>>,
}

/// Shared handle to a [`Dispatcher`].
pub type DispatcherRef = ArcShared<Dispatcher>;

impl Dispatcher {
  /// Creates a dispatcher with no invoker installed.
  #[must_use]
  pub fn new() -> Self {
    Self { current: Mutex::new(None) }
  }

  /// Creates a shared dispatcher handle with no invoker installed.
  #[must_use]
  pub fn new_ref() -> DispatcherRef {
    ArcShared::new(Self::new())
  }

  /// Installs the invoker, disposing any previously installed one first.
  pub fn init(&self, invoker: InvokerRef) {
    let previous = support::lock(&self.current).replace(invoker);
    // Dispose outside the slot lock: shutdown work may itself route through
    // this dispatcher.
    if let Some(previous) = previous {
      tracing::debug!(target: LOG_TARGET, "replacing installed invoker");
      previous.dispose();
    }
  }

  /// Returns whether an invoker is currently installed.
  #[must_use]
  pub fn is_initialized(&self) -> bool {
    support::lock(&self.current).is_some()
  }

  /// Returns the currently installed invoker.
  ///
  /// # Errors
  ///
  /// Returns [`DispatcherError::NotInitialized`] when none is installed.
  pub fn invoker(&self) -> Result<InvokerRef, DispatcherError> {
    support::lock(&self.current).clone().ok_or(DispatcherError::NotInitialized)
  }

  /// Enqueues the action on the dispatch thread and returns immediately.
  ///
  /// # Errors
  ///
  /// Returns [`DispatcherError::NotInitialized`] when no invoker is installed.
  pub fn dispatch(&self, action: impl FnOnce() + Send + 'static) -> Result<(), DispatcherError> {
    let invoker = self.invoker()?;
    invoker.dispatch(Box::new(action));
    Ok(())
  }

  /// Runs the action on the dispatch thread and blocks until it returns.
  ///
  /// Typed failures travel transparently through `R = Result<T, E>`.
  ///
  /// # Errors
  ///
  /// Returns [`DispatcherError::NotInitialized`] when no invoker is installed.
  ///
  /// # Panics
  ///
  /// Re-raises the action's own panic payload on the calling thread, so a
  /// panicking action behaves as if it had run synchronously here.
  pub fn call<R, F>(&self, action: F) -> Result<R, DispatcherError>
  where
    R: Send + 'static,
    F: FnOnce() -> R + Send + 'static, {
    let invoker = self.invoker()?;
    match call_with(invoker.as_ref(), action) {
      | Ok(value) => Ok(value),
      | Err(payload) => payload.resume(),
    }
  }

  /// Returns whether the calling thread is the dispatch thread.
  ///
  /// Degrades to `false` when no invoker is installed.
  #[must_use]
  pub fn is_dispatch_thread(&self) -> bool {
    match self.invoker() {
      | Ok(invoker) => invoker.is_dispatch_thread(),
      | Err(_) => false,
    }
  }

  /// Forwards to [`AsyncInvoker::yield_once`](crate::invoker::AsyncInvoker::yield_once).
  ///
  /// Degrades to `false` when no invoker is installed.
  pub fn yield_once(&self, block: bool) -> bool {
    match self.invoker() {
      | Ok(invoker) => invoker.yield_once(block),
      | Err(_) => false,
    }
  }

  /// Best-effort drain of the dispatch queue; no-op when uninitialized.
  pub fn flush(&self) {
    if let Ok(invoker) = self.invoker() {
      invoker.flush();
    }
  }

  /// Enqueues a dispatch-thread action that re-raises the payload.
  ///
  /// The invoker's run loop catches the re-raised payload and hands it to the
  /// configured failure sink, giving every asynchronous failure exactly one
  /// observable channel.
  ///
  /// # Errors
  ///
  /// Returns [`DispatcherError::NotInitialized`] when no invoker is installed.
  pub fn report_failure(&self, payload: FailurePayload) -> Result<(), DispatcherError> {
    self.dispatch(move || payload.resume())
  }

  /// Waits for the thread to terminate while still servicing the dispatch
  /// queue.
  ///
  /// Calling `JoinHandle::join` directly from the dispatch thread would
  /// deadlock whenever the joined thread itself needs dispatch-thread
  /// cooperation to finish; this variant interleaves
  /// [`yield_once`](Self::yield_once) with short sleeps instead.
  ///
  /// # Errors
  ///
  /// Returns the joined thread's panic payload, exactly like `JoinHandle::join`.
  pub fn join<T>(&self, handle: JoinHandle<T>) -> thread::Result<T> {
    while !handle.is_finished() {
      if !self.yield_once(false) {
        thread::sleep(JOIN_POLL);
      }
    }
    handle.join()
  }

  /// Disposes the installed invoker and clears the slot.
  pub fn dispose(&self) {
    let previous = support::lock(&self.current).take();
    if let Some(previous) = previous {
      previous.dispose();
      tracing::debug!(target: LOG_TARGET, "dispatcher disposed");
    }
  }
}

impl Default for Dispatcher {
  fn default() -> Self {
    Self::new()
  }
}
