use core::sync::atomic::{AtomicU64, Ordering};

use super::Clock;

/// Manually driven time source for tests.
#[derive(Debug, Default)]
pub struct ManualClock {
  now_millis: AtomicU64,
}

impl ManualClock {
  /// Creates a clock starting at the provided epoch-millisecond value.
  #[must_use]
  pub fn starting_at(now_millis: u64) -> Self {
    Self { now_millis: AtomicU64::new(now_millis) }
  }

  /// Advances the clock by the provided number of milliseconds.
  pub fn advance(&self, millis: u64) {
    self.now_millis.fetch_add(millis, Ordering::SeqCst);
  }

  /// Sets the clock to an absolute epoch-millisecond value.
  pub fn set(&self, now_millis: u64) {
    self.now_millis.store(now_millis, Ordering::SeqCst);
  }
}

impl Clock for ManualClock {
  fn now_millis(&self) -> u64 {
    self.now_millis.load(Ordering::SeqCst)
  }
}
