use core::fmt;

use super::{FailureOrigin, FailurePayload};

/// A failure caught by one of the runtime's run loops.
#[derive(Debug)]
pub struct DispatchFailure {
  origin:  FailureOrigin,
  payload: FailurePayload,
}

impl DispatchFailure {
  /// Pairs a payload with the run loop that caught it.
  #[must_use]
  pub fn new(origin: FailureOrigin, payload: FailurePayload) -> Self {
    Self { origin, payload }
  }

  /// Returns the run loop that caught the failure.
  #[must_use]
  pub const fn origin(&self) -> FailureOrigin {
    self.origin
  }

  /// Returns the carried payload.
  #[must_use]
  pub const fn payload(&self) -> &FailurePayload {
    &self.payload
  }

  /// Consumes the failure and returns the payload.
  #[must_use]
  pub fn into_payload(self) -> FailurePayload {
    self.payload
  }
}

impl fmt::Display for DispatchFailure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} failed: {}", self.origin, self.payload)
  }
}
