use core::{
  sync::atomic::{AtomicBool, Ordering},
  time::Duration,
};
use std::sync::Mutex;

use takt_utils_rs::sync::ArcShared;

use super::{Scratch, time_out::duration_to_millis};
use crate::{
  scheduler::{ScheduleHandle, SchedulerRef},
  support,
};


type Predicate = dyn Fn(&mut Scratch) -> bool + Send + Sync + 'static;
type Action = dyn FnOnce(&mut Scratch) + Send + 'static;

/// Shared handle to a [`Deferred`].
pub type DeferredRef = ArcShared<Deferred>;

/// Condition-gated action retried through the scheduler until ready.
///
/// Construction evaluates the readiness predicate immediately on the calling
/// thread; every retry runs on the dispatch thread. The predicate receives a
/// [`Scratch`] map that is fresh for each check, so data computed while
/// checking readiness can be handed to the action without recomputation but
/// never survives into the next retry. The action runs exactly once.
pub struct Deferred {
  scheduler:    SchedulerRef,
  retry_millis: u64,
  predicate:    Box<Predicate>,
  action:       Mutex<Option<Box<Action>>>,
  done:         AtomicBool,
  cancelled:    AtomicBool,
  handle:       Mutex<Option<ScheduleHandle>>,
}

impl Deferred {
  /// Creates the deferred and performs the first readiness check immediately.
  ///
  /// When the predicate holds right away, the action runs before this returns.
  /// Dropping the returned handle stops the retry chain.
  #[must_use]
  pub fn new(
    scheduler: SchedulerRef,
    retry: Duration,
    predicate: impl Fn(&mut Scratch) -> bool + Send + Sync + 'static,
    action: impl FnOnce(&mut Scratch) + Send + 'static,
  ) -> DeferredRef {
    let deferred = ArcShared::new(Self {
      scheduler,
      retry_millis: duration_to_millis(retry).max(1),
      predicate: Box::new(predicate),
      action: Mutex::new(Some(Box::new(action))),
      done: AtomicBool::new(false),
      cancelled: AtomicBool::new(false),
      handle: Mutex::new(None),
    });
    Self::check(&deferred);
    deferred
  }

  /// Single-closure form: the check performs its own work when it returns
  /// `true`.
  #[must_use]
  pub fn once(
    scheduler: SchedulerRef,
    retry: Duration,
    check: impl Fn(&mut Scratch) -> bool + Send + Sync + 'static,
  ) -> DeferredRef {
    Self::new(scheduler, retry, check, |_scratch| {})
  }

  /// Returns whether the action has run.
  #[must_use]
  pub fn is_done(&self) -> bool {
    self.done.load(Ordering::Acquire)
  }

  /// Stops retrying; the action never runs once cancellation wins the race
  /// with an in-flight check.
  pub fn cancel(&self) {
    self.cancelled.store(true, Ordering::Release);
    if let Some(handle) = support::lock(&self.handle).take() {
      self.scheduler.cancel(&handle);
    }
  }

  fn check(this: &DeferredRef) {
    if this.done.load(Ordering::Acquire) || this.cancelled.load(Ordering::Acquire) {
      return;
    }
    // The scratch lives on this stack frame only; predicate and action are
    // user code and run with no internal lock held.
    let mut scratch = Scratch::new();
    if (this.predicate)(&mut scratch) {
      // Flag before running so a reentrant check inside the action is a no-op.
      this.done.store(true, Ordering::Release);
      let action = support::lock(&this.action).take();
      if let Some(action) = action {
        action(&mut scratch);
      }
      return;
    }
    let weak = this.downgrade();
    let handle = this.scheduler.schedule(
      move || {
        if let Some(deferred) = weak.upgrade() {
          Deferred::check(&deferred);
        }
      },
      this.scheduler.clock().now_millis() + this.retry_millis,
    );
    *support::lock(&this.handle) = Some(handle);
  }
}
