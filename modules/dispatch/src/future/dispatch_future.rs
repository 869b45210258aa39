use core::time::Duration;
use std::{
  sync::{Condvar, Mutex},
  thread,
  time::Instant,
};

use takt_utils_rs::sync::ArcShared;

use super::FutureError;
use crate::{dispatcher::DispatcherRef, failure::FailurePayload, support};


/// How long a dispatch-thread wait sleeps when no queued work is available.
const WAIT_POLL: Duration = Duration::from_millis(1);

/// Shared handle to a [`DispatchFuture`].
pub type FutureRef<R, E> = ArcShared<DispatchFuture<R, E>>;

/// Cross-thread bridge from an asynchronous producer to a blocking consumer.
///
/// Completed exactly once by one of the `set_*` operations; completing twice
/// is a programmer error. The stored outcome is handed to the first
/// successful [`get_result`](Self::get_result), which blocks with a timeout;
/// asking again after the outcome was handed out is likewise a programmer
/// error.
/// A consumer blocking on the dispatch thread keeps servicing the dispatch
/// queue while it waits, so producers that themselves need dispatch-thread
/// cooperation still make progress.
pub struct DispatchFuture<R, E> {
  dispatcher: DispatcherRef,
  state:      Mutex<FutureState<R, E>>,
  completed:  Condvar,
}

enum FutureState<R, E> {
  Pending,
  Value(R),
  TypedError(E),
  Failure(FailurePayload),
  Taken,
}

impl<R, E> FutureState<R, E> {
  fn is_pending(&self) -> bool {
    matches!(self, FutureState::Pending)
  }
}

impl<R, E> DispatchFuture<R, E>
where
  R: Send + 'static,
  E: Send + 'static,
{
  /// Creates an incomplete future bound to the given dispatcher.
  #[must_use]
  pub fn new(dispatcher: DispatcherRef) -> Self {
    Self { dispatcher, state: Mutex::new(FutureState::Pending), completed: Condvar::new() }
  }

  /// Creates a shared handle to an incomplete future.
  #[must_use]
  pub fn new_ref(dispatcher: DispatcherRef) -> FutureRef<R, E> {
    ArcShared::new(Self::new(dispatcher))
  }

  /// Completes the future with a value.
  ///
  /// # Panics
  ///
  /// Panics when the future was already completed.
  pub fn set_result(&self, value: R) {
    self.complete(FutureState::Value(value));
  }

  /// Completes the future with a typed failure.
  ///
  /// # Panics
  ///
  /// Panics when the future was already completed.
  pub fn set_error(&self, error: E) {
    self.complete(FutureState::TypedError(error));
  }

  /// Completes the future with an untyped failure payload.
  ///
  /// # Panics
  ///
  /// Panics when the future was already completed.
  pub fn set_failure(&self, payload: FailurePayload) {
    self.complete(FutureState::Failure(payload));
  }

  /// Returns whether the future has been completed.
  #[must_use]
  pub fn is_completed(&self) -> bool {
    !support::lock(&self.state).is_pending()
  }

  /// Blocks until the outcome is available and returns it.
  ///
  /// A `timeout` of [`Duration::ZERO`] waits forever; a positive timeout
  /// yields `None` once elapsed without completion. Timing out never cancels
  /// the producer. Waiting on the dispatch thread interleaves
  /// [`yield_once`](crate::dispatcher::Dispatcher::yield_once) with short
  /// sleeps instead of a native wait, so the queue keeps draining.
  ///
  /// # Panics
  ///
  /// Panics when the outcome was already handed to an earlier call; `None`
  /// always means the timeout elapsed, never a consumed result.
  pub fn get_result(&self, timeout: Duration) -> Option<Result<R, FutureError<E>>> {
    let deadline = if timeout.is_zero() { None } else { Some(Instant::now() + timeout) };
    if self.dispatcher.is_dispatch_thread() {
      return self.wait_servicing_queue(deadline);
    }
    let mut state = support::lock(&self.state);
    loop {
      if let Some(outcome) = take_outcome(&mut state) {
        return Some(outcome);
      }
      match deadline {
        | None => state = support::wait(&self.completed, state),
        | Some(deadline) => {
          let now = Instant::now();
          if now >= deadline {
            return None;
          }
          state = support::wait_timeout(&self.completed, state, deadline - now);
        },
      }
    }
  }

  fn wait_servicing_queue(&self, deadline: Option<Instant>) -> Option<Result<R, FutureError<E>>> {
    loop {
      {
        let mut state = support::lock(&self.state);
        if let Some(outcome) = take_outcome(&mut state) {
          return Some(outcome);
        }
      }
      if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
        return None;
      }
      if !self.dispatcher.yield_once(false) {
        thread::sleep(WAIT_POLL);
      }
    }
  }

  fn complete(&self, outcome: FutureState<R, E>) {
    let mut state = support::lock(&self.state);
    assert!(state.is_pending(), "future completed twice");
    *state = outcome;
    self.completed.notify_all();
  }
}

impl<E> DispatchFuture<(), E>
where
  E: Send + 'static,
{
  /// Completes a unit-valued future.
  ///
  /// # Panics
  ///
  /// Panics when the future was already completed.
  pub fn set_unit(&self) {
    self.set_result(());
  }
}

/// Moves a stored outcome out, leaving [`FutureState::Taken`] behind.
///
/// Stored failures take priority over a stored value by construction: only
/// one variant can ever be stored. Observing [`FutureState::Taken`] means a
/// second consumer asked for an outcome that was already handed out, which is
/// a programmer error just like completing twice.
fn take_outcome<R, E>(state: &mut FutureState<R, E>) -> Option<Result<R, FutureError<E>>> {
  match core::mem::replace(state, FutureState::Taken) {
    | FutureState::Value(value) => Some(Ok(value)),
    | FutureState::TypedError(error) => Some(Err(FutureError::Typed(error))),
    | FutureState::Failure(payload) => Some(Err(FutureError::Untyped(payload))),
    | FutureState::Pending => {
      *state = FutureState::Pending;
      None
    },
    | FutureState::Taken => panic!("future result already taken"),
  }
}
