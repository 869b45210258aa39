use std::sync::Weak;

use super::ArcShared;

/// Liveness-checked weak counterpart of [`ArcShared`].
///
/// Holding a `WeakShared` never extends the lifetime of the target; callers
/// must `upgrade` before every use and treat `None` as "target collected".
#[repr(transparent)]
pub struct WeakShared<T: ?Sized>(Weak<T>);

impl<T: ?Sized> WeakShared<T> {
  /// Wraps an existing `Weak` handle.
  #[must_use]
  pub const fn from_weak(inner: Weak<T>) -> Self {
    Self(inner)
  }

  /// Attempts to restore a strong handle; `None` once the target is gone.
  #[must_use]
  pub fn upgrade(&self) -> Option<ArcShared<T>> {
    self.0.upgrade().map(ArcShared::from_arc)
  }

  /// Returns whether the target allocation is still alive.
  #[must_use]
  pub fn is_alive(&self) -> bool {
    self.0.strong_count() > 0
  }

  /// Returns the allocation address recorded at downgrade time.
  ///
  /// The address is only meaningful for identity comparison while
  /// [`is_alive`](Self::is_alive) holds.
  #[must_use]
  pub fn addr(&self) -> usize {
    self.0.as_ptr() as *const () as usize
  }
}

impl<T: ?Sized> Clone for WeakShared<T> {
  fn clone(&self) -> Self {
    Self(self.0.clone())
  }
}
