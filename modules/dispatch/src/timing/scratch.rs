use core::any::Any;

use ahash::RandomState;
use hashbrown::HashMap;


/// Ephemeral key-value store shared between a readiness check and the action
/// that follows it.
///
/// [`Deferred`](super::Deferred) hands a fresh map to every readiness check,
/// so nothing survives a failed check; values stored during the successful
/// check are visible to the action without recomputation.
pub struct Scratch {
  entries: HashMap<String, Box<dyn Any + Send>, RandomState>,
}

impl Scratch {
  pub(crate) fn new() -> Self {
    Self { entries: HashMap::with_hasher(RandomState::new()) }
  }

  /// Stores `value` under `key`, replacing any previous value.
  pub fn put<T: Any + Send>(&mut self, key: impl Into<String>, value: T) {
    self.entries.insert(key.into(), Box::new(value));
  }

  /// Returns a reference to the value stored under `key`, if its type matches.
  #[must_use]
  pub fn get<T: Any + Send>(&self, key: &str) -> Option<&T> {
    self.entries.get(key).and_then(|value| value.downcast_ref())
  }

  /// Removes and returns the value stored under `key`, if its type matches.
  ///
  /// A value of the wrong type stays in the map.
  pub fn take<T: Any + Send>(&mut self, key: &str) -> Option<T> {
    if !self.entries.get(key).is_some_and(|value| value.is::<T>()) {
      return None;
    }
    let boxed = self.entries.remove(key)?;
    match boxed.downcast::<T>() {
      | Ok(value) => Some(*value),
      | Err(_) => None,
    }
  }

  /// Returns whether a value is stored under `key`.
  #[must_use]
  pub fn contains(&self, key: &str) -> bool {
    self.entries.contains_key(key)
  }

  /// Number of stored entries.
  #[must_use]
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  /// Returns whether the map is empty.
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

impl core::fmt::Debug for Scratch {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("Scratch").field("len", &self.entries.len()).finish()
  }
}
