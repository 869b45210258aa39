use core::{
  sync::atomic::{AtomicU64, Ordering},
  time::Duration,
};
use std::sync::Mutex;

use takt_utils_rs::sync::ArcShared;

use crate::{
  scheduler::{ScheduleHandle, SchedulerRef, SchedulerRunnable},
  support,
};


/// One-shot delayed action with re-armable countdown.
///
/// `enable` and `disable` are idempotent; `reset` arms a disabled timeout and
/// restarts the countdown of an enabled one. The delay is sampled when a
/// countdown is started, so [`update_delay`](Self::update_delay) only affects
/// the next arm or reset, never one already in flight.
pub struct TimeOut {
  scheduler:    SchedulerRef,
  action:       ArcShared<dyn SchedulerRunnable>,
  delay_millis: AtomicU64,
  handle:       Mutex<Option<ScheduleHandle>>,
}

impl TimeOut {
  /// Creates a disabled timeout firing `action` after `delay` once enabled.
  #[must_use]
  pub fn new(scheduler: SchedulerRef, delay: Duration, action: impl Fn() + Send + Sync + 'static) -> Self {
    Self {
      scheduler,
      action: ArcShared::from_arc(std::sync::Arc::new(action) as std::sync::Arc<dyn SchedulerRunnable>),
      delay_millis: AtomicU64::new(duration_to_millis(delay)),
      handle: Mutex::new(None),
    }
  }

  /// Arms the countdown at `now + delay`; no-op while already enabled.
  pub fn enable(&self) {
    let mut slot = support::lock(&self.handle);
    if slot.as_ref().is_some_and(|handle| handle.is_pending()) {
      return;
    }
    *slot = Some(self.arm());
  }

  /// Cancels a pending countdown; no-op while disabled.
  pub fn disable(&self) {
    if let Some(handle) = support::lock(&self.handle).take() {
      self.scheduler.cancel(&handle);
    }
  }

  /// Arms a disabled timeout, or restarts the countdown of an enabled one.
  pub fn reset(&self) {
    let mut slot = support::lock(&self.handle);
    match slot.take() {
      | Some(handle) if handle.is_pending() => {
        self.scheduler.reschedule(&handle, self.deadline());
        *slot = Some(handle);
      },
      | _ => *slot = Some(self.arm()),
    }
  }

  /// Changes the delay used by the next arm or reset.
  pub fn update_delay(&self, delay: Duration) {
    self.delay_millis.store(duration_to_millis(delay), Ordering::Release);
  }

  /// Returns whether a countdown is currently pending.
  #[must_use]
  pub fn is_enabled(&self) -> bool {
    support::lock(&self.handle).as_ref().is_some_and(|handle| handle.is_pending())
  }

  fn deadline(&self) -> u64 {
    self.scheduler.clock().now_millis() + self.delay_millis.load(Ordering::Acquire)
  }

  fn arm(&self) -> ScheduleHandle {
    self.scheduler.schedule_runnable(self.action.clone(), self.deadline())
  }
}

impl Drop for TimeOut {
  fn drop(&mut self) {
    self.disable();
  }
}

pub(crate) fn duration_to_millis(duration: Duration) -> u64 {
  u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
