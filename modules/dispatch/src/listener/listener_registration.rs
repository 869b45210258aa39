use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use takt_utils_rs::sync::{ArcShared, WeakShared};

use super::AliasKey;
use crate::support;

/// One `add`/`add_weak` entry in a group's registry.
///
/// Adding the same listener twice creates two independent registrations.
pub(crate) struct ListenerRegistration<L: ?Sized> {
  target:  ListenerTarget<L>,
  removed: AtomicBool,
  aliases: Mutex<Vec<AliasKey>>,
}

enum ListenerTarget<L: ?Sized> {
  Strong(ArcShared<L>),
  Weak(WeakShared<L>),
}

impl<L: ?Sized> ListenerRegistration<L> {
  pub(crate) fn strong(listener: ArcShared<L>) -> Self {
    Self { target: ListenerTarget::Strong(listener), removed: AtomicBool::new(false), aliases: Mutex::new(Vec::new()) }
  }

  pub(crate) fn weak(listener: &ArcShared<L>) -> Self {
    Self {
      target:  ListenerTarget::Weak(listener.downgrade()),
      removed: AtomicBool::new(false),
      aliases: Mutex::new(Vec::new()),
    }
  }

  /// Returns the listener when the registration still delivers: not removed,
  /// and for weak registrations the target is still alive.
  pub(crate) fn live_target(&self) -> Option<ArcShared<L>> {
    if self.removed.load(Ordering::Acquire) {
      return None;
    }
    match &self.target {
      | ListenerTarget::Strong(listener) => Some(listener.clone()),
      | ListenerTarget::Weak(listener) => listener.upgrade(),
    }
  }

  /// Returns whether the registration is gone for good: removed, or weakly
  /// held with a collected target.
  pub(crate) fn is_defunct(&self) -> bool {
    if self.removed.load(Ordering::Acquire) {
      return true;
    }
    match &self.target {
      | ListenerTarget::Strong(_) => false,
      | ListenerTarget::Weak(listener) => !listener.is_alive(),
    }
  }

  pub(crate) fn mark_removed(&self) {
    self.removed.store(true, Ordering::Release);
  }

  pub(crate) fn add_alias(&self, alias: AliasKey) {
    support::lock(&self.aliases).push(alias);
  }

  pub(crate) fn has_alias(&self, alias: &AliasKey) -> bool {
    support::lock(&self.aliases).iter().any(|candidate| candidate.matches(alias))
  }
}
