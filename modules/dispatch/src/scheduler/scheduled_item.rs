use core::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use takt_utils_rs::sync::ArcShared;

use super::SchedulerRunnable;

const STATE_PENDING: u8 = 0;
const STATE_CANCELLED: u8 = 1;
const STATE_FIRED: u8 = 2;

/// Shared handle to a scheduled entry, returned by `Scheduler::schedule`.
pub type ScheduleHandle = ArcShared<ScheduledItem>;

/// One pending entry in the scheduler's time index.
///
/// An item resides in at most one time bucket at a time. Cancellation is
/// idempotent and safe to request after firing; a cancel racing the
/// scheduler's firing decision may still let the action run once.
pub struct ScheduledItem {
  runnable:    ArcShared<dyn SchedulerRunnable>,
  when_millis: AtomicU64,
  state:       AtomicU8,
}

impl ScheduledItem {
  pub(crate) fn new(runnable: ArcShared<dyn SchedulerRunnable>, when_millis: u64) -> Self {
    Self { runnable, when_millis: AtomicU64::new(when_millis), state: AtomicU8::new(STATE_PENDING) }
  }

  /// Returns the epoch-millisecond time the item is currently set to fire at.
  #[must_use]
  pub fn scheduled_time_millis(&self) -> u64 {
    self.when_millis.load(Ordering::Acquire)
  }

  /// Returns the stored action.
  #[must_use]
  pub fn runnable(&self) -> ArcShared<dyn SchedulerRunnable> {
    self.runnable.clone()
  }

  /// Returns whether the item was cancelled before firing.
  #[must_use]
  pub fn is_cancelled(&self) -> bool {
    self.state.load(Ordering::Acquire) == STATE_CANCELLED
  }

  /// Returns whether the item already fired.
  #[must_use]
  pub fn has_fired(&self) -> bool {
    self.state.load(Ordering::Acquire) == STATE_FIRED
  }

  pub(crate) fn is_pending(&self) -> bool {
    self.state.load(Ordering::Acquire) == STATE_PENDING
  }

  /// Marks cancelled; no-op once fired. Returns whether the mark stuck.
  pub(crate) fn mark_cancelled(&self) -> bool {
    self
      .state
      .compare_exchange(STATE_PENDING, STATE_CANCELLED, Ordering::AcqRel, Ordering::Acquire)
      .is_ok()
  }

  /// Claims the fire transition; loses to a concurrent cancel.
  pub(crate) fn mark_fired(&self) -> bool {
    self.state.compare_exchange(STATE_PENDING, STATE_FIRED, Ordering::AcqRel, Ordering::Acquire).is_ok()
  }

  pub(crate) fn set_scheduled_time_millis(&self, when_millis: u64) {
    self.when_millis.store(when_millis, Ordering::Release);
  }

  /// Runs the action unless the item was cancelled in the meantime.
  pub(crate) fn run(&self) {
    if !self.is_cancelled() {
      self.runnable.run();
    }
  }
}
