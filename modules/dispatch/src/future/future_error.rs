use core::fmt;

use crate::failure::FailurePayload;

/// Failed outcome of a [`DispatchFuture`](super::DispatchFuture).
#[derive(Debug)]
pub enum FutureError<E> {
  /// The producer stored a typed failure.
  Typed(E),
  /// The producer stored an untyped failure, usually a caught panic payload.
  Untyped(FailurePayload),
}

impl<E> FutureError<E> {
  /// Returns the typed failure, if this is one.
  pub fn into_typed(self) -> Option<E> {
    match self {
      | Self::Typed(error) => Some(error),
      | Self::Untyped(_) => None,
    }
  }
}

impl<E: fmt::Display> fmt::Display for FutureError<E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      | Self::Typed(error) => write!(f, "{error}"),
      | Self::Untyped(payload) => write!(f, "{payload}"),
    }
  }
}
