//! Crate-private locking helpers.
//!
//! User code never runs while one of the runtime's internal locks is held, so
//! poisoning carries no information here; the helpers recover the guard.

use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

pub(crate) fn lock<'a, T>(mutex: &'a Mutex<T>) -> MutexGuard<'a, T> {
  match mutex.lock() {
    | Ok(guard) => guard,
    | Err(poisoned) => poisoned.into_inner(),
  }
}

pub(crate) fn wait<'a, T>(condvar: &Condvar, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
  match condvar.wait(guard) {
    | Ok(next) => next,
    | Err(poisoned) => poisoned.into_inner(),
  }
}

pub(crate) fn wait_timeout<'a, T>(
  condvar: &Condvar,
  guard: MutexGuard<'a, T>,
  timeout: Duration,
) -> MutexGuard<'a, T> {
  match condvar.wait_timeout(guard, timeout) {
    | Ok((next, _)) => next,
    | Err(poisoned) => poisoned.into_inner().0,
  }
}
