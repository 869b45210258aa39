use core::{
  sync::atomic::{AtomicBool, AtomicU64, Ordering},
  time::Duration,
};
use std::sync::Mutex;

use takt_utils_rs::sync::{ArcShared, WeakShared};

use super::time_out::duration_to_millis;
use crate::{
  scheduler::{ScheduleHandle, SchedulerRef, SchedulerRunnable},
  support,
};


/// Repeating action that fires on the dispatch thread without drifting.
///
/// Each firing is scheduled at *previous expected time + interval*, not at
/// `now + interval`, so the action's own run time does not push later firings
/// back. When the next expected time is already past (the action overran the
/// interval) or lies more than one interval ahead (a clock jump), the schedule
/// resynchronizes to `now + interval` instead of delivering a backlog of
/// missed ticks.
pub struct Timer {
  core: ArcShared<TimerCore>,
}

struct TimerCore {
  scheduler:       SchedulerRef,
  action:          ArcShared<dyn SchedulerRunnable>,
  interval_millis: u64,
  expected_millis: AtomicU64,
  running:         AtomicBool,
  handle:          Mutex<Option<ScheduleHandle>>,
}

impl TimerCore {
  /// Runs one tick on the dispatch thread, then arms the next.
  fn tick(this: &ArcShared<Self>) {
    if !this.running.load(Ordering::Acquire) {
      return;
    }
    this.action.run();
    if !this.running.load(Ordering::Acquire) {
      // The action stopped the timer; do not re-arm.
      return;
    }
    let now = this.scheduler.clock().now_millis();
    let mut next = this.expected_millis.load(Ordering::Acquire) + this.interval_millis;
    if next <= now || next > now + this.interval_millis {
      next = now + this.interval_millis;
    }
    Self::arm(this, next);
  }

  fn arm(this: &ArcShared<Self>, when_millis: u64) {
    this.expected_millis.store(when_millis, Ordering::Release);
    let weak: WeakShared<Self> = this.downgrade();
    let handle = this.scheduler.schedule(
      move || {
        if let Some(core) = weak.upgrade() {
          Self::tick(&core);
        }
      },
      when_millis,
    );
    *support::lock(&this.handle) = Some(handle);
  }
}

impl Timer {
  /// Creates a stopped timer firing `action` every `interval`.
  ///
  /// Intervals shorter than one millisecond are clamped to one.
  #[must_use]
  pub fn new(scheduler: SchedulerRef, interval: Duration, action: impl Fn() + Send + Sync + 'static) -> Self {
    Self {
      core: ArcShared::new(TimerCore {
        scheduler,
        action: ArcShared::from_arc(std::sync::Arc::new(action) as std::sync::Arc<dyn SchedulerRunnable>),
        interval_millis: duration_to_millis(interval).max(1),
        expected_millis: AtomicU64::new(0),
        running: AtomicBool::new(false),
        handle: Mutex::new(None),
      }),
    }
  }

  /// Starts the timer; the first firing is one interval from now.
  ///
  /// No-op while already running. Restarting a stopped timer resynchronizes
  /// rather than resuming the old cadence.
  pub fn start(&self) {
    if self.core.running.swap(true, Ordering::AcqRel) {
      return;
    }
    let first = self.core.scheduler.clock().now_millis() + self.core.interval_millis;
    TimerCore::arm(&self.core, first);
  }

  /// Stops the timer and cancels its pending firing; idempotent.
  pub fn stop(&self) {
    if !self.core.running.swap(false, Ordering::AcqRel) {
      return;
    }
    if let Some(handle) = support::lock(&self.core.handle).take() {
      self.core.scheduler.cancel(&handle);
    }
  }

  /// Returns whether the timer is currently running.
  #[must_use]
  pub fn is_running(&self) -> bool {
    self.core.running.load(Ordering::Acquire)
  }
}

impl Drop for Timer {
  fn drop(&mut self) {
    self.stop();
  }
}
