use core::any::Any;

use ahash::RandomState;
use hashbrown::HashMap;
use std::sync::Mutex;

use takt_utils_rs::sync::WeakShared;

use super::{MergeKey, merge_strategy::MergeAction, queued_event_item::PendingEvent};
use crate::support;

/// Candidates examined per merge attempt before giving up.
///
/// A bucket larger than this means the dispatch thread is badly behind;
/// skipping the merge is cheaper than scanning, and only costs an extra
/// delivery.
pub(crate) const MERGE_SCAN_CAP: usize = 100;

type SlotKey = (usize, MergeKey);

/// Pending not-yet-invoked items, bucketed per (listener identity, group key).
///
/// Items are held weakly; the queued closure owns them, so a dropped delivery
/// disappears from the index on the next scan.
pub(crate) struct MergeIndex {
  entries: Mutex<HashMap<SlotKey, Vec<WeakShared<dyn PendingEvent>>, RandomState>>,
}

impl MergeIndex {
  pub(crate) fn new() -> Self {
    Self { entries: Mutex::new(HashMap::with_hasher(RandomState::new())) }
  }

  /// Attempts to fold `incoming` into a pending item of the bucket, in
  /// queue-insertion order. Returns whether some item absorbed it.
  ///
  /// Candidates are snapshotted under the lock but asked to absorb outside
  /// it, since combiners are user code.
  pub(crate) fn try_merge(
    &self,
    listener_addr: usize,
    key: &MergeKey,
    incoming: &dyn Any,
    action: &MergeAction,
  ) -> bool {
    let candidates = {
      let mut entries = support::lock(&self.entries);
      let Some(bucket) = entries.get_mut(&(listener_addr, key.clone())) else {
        return false;
      };
      bucket.retain(WeakShared::is_alive);
      if bucket.len() > MERGE_SCAN_CAP {
        return false;
      }
      bucket.iter().filter_map(WeakShared::upgrade).collect::<Vec<_>>()
    };
    for candidate in candidates {
      if candidate.try_absorb(incoming, action) {
        return true;
      }
    }
    false
  }

  /// Makes a freshly queued item a merge candidate.
  pub(crate) fn link(&self, listener_addr: usize, key: MergeKey, item: WeakShared<dyn PendingEvent>) {
    let mut entries = support::lock(&self.entries);
    entries.entry((listener_addr, key)).or_default().push(item);
  }

  /// Removes one item from its bucket; called exactly once, right before the
  /// item is invoked.
  pub(crate) fn unlink(&self, listener_addr: usize, key: &MergeKey, item_addr: usize) {
    let mut entries = support::lock(&self.entries);
    if let Some(bucket) = entries.get_mut(&(listener_addr, key.clone())) {
      bucket.retain(|weak| weak.is_alive() && weak.addr() != item_addr);
      if bucket.is_empty() {
        entries.remove(&(listener_addr, key.clone()));
      }
    }
  }

  /// Live not-yet-invoked items across all buckets.
  pub(crate) fn pending_len(&self) -> usize {
    let entries = support::lock(&self.entries);
    entries
      .values()
      .map(|bucket| {
        bucket.iter().filter_map(WeakShared::upgrade).filter(|item| !item.is_invoked()).count()
      })
      .sum()
  }
}
