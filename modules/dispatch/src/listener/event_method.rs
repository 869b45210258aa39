use core::fmt;

/// Identity of one event method on a broadcaster.
///
/// Broadcaster types declare one constant per event method and pass it to
/// [`ListenerGroup::emit`](super::ListenerGroup::emit); merge actions can
/// restrict themselves to a single method through it.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventMethod(&'static str);

impl EventMethod {
  /// Creates a method identity from its name.
  #[must_use]
  pub const fn new(name: &'static str) -> Self {
    Self(name)
  }

  /// Returns the method name.
  #[must_use]
  pub const fn name(&self) -> &'static str {
    self.0
  }
}

impl fmt::Debug for EventMethod {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "EventMethod({})", self.0)
  }
}

impl fmt::Display for EventMethod {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.0)
  }
}
