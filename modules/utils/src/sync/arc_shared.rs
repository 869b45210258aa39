use core::{fmt, ops::Deref};
use std::sync::Arc;

use super::WeakShared;


/// Shared wrapper backed by [`std::sync::Arc`].
///
/// The runtime passes every shared handle through this wrapper so call sites
/// stay independent of the concrete reference-counting type.
#[repr(transparent)]
pub struct ArcShared<T: ?Sized>(Arc<T>);

impl<T: ?Sized> ArcShared<T> {
  /// Creates a new `ArcShared` by wrapping the provided value.
  pub fn new(value: T) -> Self
  where
    T: Sized, {
    Self(Arc::new(value))
  }

  /// Wraps an existing `Arc` in the shared wrapper.
  ///
  /// This is the construction path for trait-object handles:
  /// `ArcShared::from_arc(Arc::new(value) as Arc<dyn Trait>)`.
  #[must_use]
  pub const fn from_arc(inner: Arc<T>) -> Self {
    Self(inner)
  }

  /// Consumes the wrapper and returns the inner `Arc`.
  #[must_use]
  pub fn into_arc(self) -> Arc<T> {
    self.0
  }

  /// Creates a liveness-checked weak handle to the same allocation.
  #[must_use]
  pub fn downgrade(&self) -> WeakShared<T> {
    WeakShared::from_weak(Arc::downgrade(&self.0))
  }

  /// Returns whether both handles point at the same allocation.
  #[must_use]
  pub fn ptr_eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.0, &other.0)
  }

  /// Returns the allocation address, usable as an identity key.
  #[must_use]
  pub fn addr(&self) -> usize {
    Arc::as_ptr(&self.0) as *const () as usize
  }

  /// Returns the number of strong handles to the allocation.
  #[must_use]
  pub fn strong_count(&self) -> usize {
    Arc::strong_count(&self.0)
  }
}

impl<T: ?Sized> Clone for ArcShared<T> {
  fn clone(&self) -> Self {
    Self(Arc::clone(&self.0))
  }
}

impl<T: ?Sized> Deref for ArcShared<T> {
  type Target = T;

  fn deref(&self) -> &T {
    &self.0
  }
}

impl<T: ?Sized> AsRef<T> for ArcShared<T> {
  fn as_ref(&self) -> &T {
    &self.0
  }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for ArcShared<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(&self.0, f)
  }
}

impl<T: Default> Default for ArcShared<T> {
  fn default() -> Self {
    Self::new(T::default())
  }
}
