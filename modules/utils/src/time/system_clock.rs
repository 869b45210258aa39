use std::time::{SystemTime, UNIX_EPOCH};

use super::Clock;

/// Wall-clock time source.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now_millis(&self) -> u64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
      | Ok(elapsed) => elapsed.as_millis() as u64,
      | Err(_) => 0,
    }
  }
}
