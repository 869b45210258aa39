use core::time::Duration;
use std::sync::{Condvar, Mutex};


/// Blocking count-down latch.
///
/// The count only ever decreases; once it reaches zero every current and
/// future waiter is released immediately.
#[derive(Debug)]
pub struct CountDownLatch {
  count:    Mutex<usize>,
  released: Condvar,
}

impl CountDownLatch {
  /// Creates a latch with the specified count value.
  #[must_use]
  pub fn new(count: usize) -> Self {
    Self { count: Mutex::new(count), released: Condvar::new() }
  }

  /// Decrements the count by one, releasing waiters when it reaches zero.
  ///
  /// Counting down past zero is a no-op.
  pub fn count_down(&self) {
    let mut guard = lock_ignoring_poison(&self.count);
    if *guard > 0 {
      *guard -= 1;
      if *guard == 0 {
        self.released.notify_all();
      }
    }
  }

  /// Returns the remaining count.
  #[must_use]
  pub fn count(&self) -> usize {
    *lock_ignoring_poison(&self.count)
  }

  /// Blocks the calling thread until the count reaches zero.
  pub fn wait(&self) {
    let mut guard = lock_ignoring_poison(&self.count);
    while *guard > 0 {
      guard = match self.released.wait(guard) {
        | Ok(next) => next,
        | Err(poisoned) => poisoned.into_inner(),
      };
    }
  }

  /// Blocks until the count reaches zero or the timeout elapses.
  ///
  /// Returns `true` when the latch opened within the timeout.
  #[must_use]
  pub fn wait_timeout(&self, timeout: Duration) -> bool {
    let deadline = std::time::Instant::now() + timeout;
    let mut guard = lock_ignoring_poison(&self.count);
    while *guard > 0 {
      let now = std::time::Instant::now();
      if now >= deadline {
        return false;
      }
      guard = match self.released.wait_timeout(guard, deadline - now) {
        | Ok((next, _)) => next,
        | Err(poisoned) => poisoned.into_inner().0,
      };
    }
    true
  }
}

fn lock_ignoring_poison<'a, T>(mutex: &'a Mutex<T>) -> std::sync::MutexGuard<'a, T> {
  match mutex.lock() {
    | Ok(guard) => guard,
    | Err(poisoned) => poisoned.into_inner(),
  }
}
