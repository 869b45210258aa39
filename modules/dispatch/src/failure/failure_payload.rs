use core::{any::Any, fmt};


/// Opaque failure value carried across thread boundaries.
///
/// Wraps the payload of a caught panic so it can be stored, routed to a
/// [`FailureSink`](super::FailureSink), and re-raised on another thread with
/// its original type intact.
pub struct FailurePayload {
  inner: Box<dyn Any + Send + 'static>,
}

impl FailurePayload {
  /// Wraps a caught panic payload.
  #[must_use]
  pub fn new(inner: Box<dyn Any + Send + 'static>) -> Self {
    Self { inner }
  }

  /// Creates a payload from a plain message.
  #[must_use]
  pub fn from_message(message: impl Into<String>) -> Self {
    Self { inner: Box::new(message.into()) }
  }

  /// Returns a human-readable rendering of the payload.
  ///
  /// String-ish payloads (the common case for `panic!` messages) are shown
  /// verbatim; anything else renders as an opaque marker.
  #[must_use]
  pub fn describe(&self) -> String {
    if let Some(text) = self.inner.downcast_ref::<&'static str>() {
      (*text).to_owned()
    } else if let Some(text) = self.inner.downcast_ref::<String>() {
      text.clone()
    } else {
      String::from("non-string panic payload")
    }
  }

  /// Attempts to view the payload as a concrete type.
  #[must_use]
  pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
    self.inner.downcast_ref::<T>()
  }

  /// Re-raises the payload on the calling thread, preserving its type.
  pub fn resume(self) -> ! {
    std::panic::resume_unwind(self.inner)
  }

  /// Consumes the wrapper and returns the raw payload.
  #[must_use]
  pub fn into_inner(self) -> Box<dyn Any + Send + 'static> {
    self.inner
  }
}

impl fmt::Debug for FailurePayload {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("FailurePayload").field(&self.describe()).finish()
  }
}

impl fmt::Display for FailurePayload {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.describe())
  }
}
