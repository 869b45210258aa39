use takt_utils_rs::sync::ArcShared;

use super::{AliasKey, listener_registration::ListenerRegistration};

/// Handle to one registration, returned by
/// [`ListenerGroup::add`](super::ListenerGroup::add) and
/// [`add_weak`](super::ListenerGroup::add_weak).
///
/// Dropping the handle does not remove the registration.
pub struct ListenerHandle<L: ?Sized> {
  registration: ArcShared<ListenerRegistration<L>>,
}

impl<L: ?Sized> ListenerHandle<L> {
  pub(crate) fn new(registration: ArcShared<ListenerRegistration<L>>) -> Self {
    Self { registration }
  }

  /// Removes the registration; idempotent. Events already queued for the
  /// listener are still delivered.
  pub fn remove(&self) {
    self.registration.mark_removed();
  }

  /// Attaches an alias key so
  /// [`remove_all_alias`](super::ListenerGroup::remove_all_alias) can drop
  /// this registration without the original listener reference; chainable.
  pub fn alias(&self, key: AliasKey) -> &Self {
    self.registration.add_alias(key);
    self
  }
}

impl<L: ?Sized> Clone for ListenerHandle<L> {
  fn clone(&self) -> Self {
    Self { registration: self.registration.clone() }
  }
}
