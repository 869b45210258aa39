use core::any::Any;
use std::sync::Arc;

use takt_utils_rs::sync::{ArcShared, WeakShared};


/// Equality-comparable value part of an [`AliasKey`].
///
/// Implemented for every `PartialEq + Send + Sync + 'static` type through a
/// blanket impl; parts of different concrete types never compare equal.
pub trait AliasValue: Send + Sync + 'static {
  /// Compares against another part, which may be of a different type.
  fn eq_dyn(&self, other: &dyn AliasValue) -> bool;
  /// Upcast used by [`eq_dyn`](Self::eq_dyn) implementations.
  fn as_any(&self) -> &dyn Any;
}

impl<T> AliasValue for T
where
  T: PartialEq + Send + Sync + 'static,
{
  fn eq_dyn(&self, other: &dyn AliasValue) -> bool {
    match other.as_any().downcast_ref::<T>() {
      | Some(other) => self == other,
      | None => false,
    }
  }

  fn as_any(&self) -> &dyn Any {
    self
  }
}

enum AliasPart {
  Value(Box<dyn AliasValue>),
  Object(WeakShared<dyn Any + Send + Sync>),
}

impl AliasPart {
  fn matches(&self, other: &AliasPart) -> bool {
    match (self, other) {
      | (AliasPart::Value(left), AliasPart::Value(right)) => left.eq_dyn(right.as_ref()),
      | (AliasPart::Object(left), AliasPart::Object(right)) => match (left.upgrade(), right.upgrade()) {
        // A collected object part matches nothing, itself included.
        | (Some(left), Some(right)) => left.addr() == right.addr(),
        | _ => false,
      },
      | _ => false,
    }
  }
}

/// Opaque key tuple attached to listener registrations for bulk removal.
///
/// Value parts compare by ordinary equality; object parts are held weakly and
/// compare by liveness-checked identity, so alias bookkeeping never extends a
/// listener's lifetime.
pub struct AliasKey {
  parts: Vec<AliasPart>,
}

impl AliasKey {
  /// Creates an empty key; chain [`value`](Self::value) and
  /// [`object`](Self::object) to add parts.
  #[must_use]
  pub fn new() -> Self {
    Self { parts: Vec::new() }
  }

  /// Appends a part compared by equality.
  #[must_use]
  pub fn value(mut self, part: impl AliasValue) -> Self {
    self.parts.push(AliasPart::Value(Box::new(part)));
    self
  }

  /// Appends a part compared by liveness-checked identity.
  #[must_use]
  pub fn object<T: Any + Send + Sync>(mut self, target: &ArcShared<T>) -> Self {
    let arc: Arc<dyn Any + Send + Sync> = target.clone().into_arc();
    self.parts.push(AliasPart::Object(WeakShared::from_weak(Arc::downgrade(&arc))));
    self
  }

  /// Compares two keys part-wise.
  ///
  /// Not an `Eq` implementation on purpose: a key containing a collected
  /// object part does not even match itself.
  #[must_use]
  pub fn matches(&self, other: &AliasKey) -> bool {
    self.parts.len() == other.parts.len()
      && self.parts.iter().zip(other.parts.iter()).all(|(left, right)| left.matches(right))
  }

  /// Number of parts in the tuple.
  #[must_use]
  pub fn len(&self) -> usize {
    self.parts.len()
  }

  /// Returns whether the tuple has no parts.
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.parts.is_empty()
  }
}

impl Default for AliasKey {
  fn default() -> Self {
    Self::new()
  }
}

impl core::fmt::Debug for AliasKey {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("AliasKey").field("parts", &self.parts.len()).finish()
  }
}
