use core::{
  any::Any,
  sync::atomic::{AtomicBool, AtomicU64, Ordering},
};
use std::sync::Mutex;

use takt_utils_rs::sync::ArcShared;

use super::{EventMethod, MergeIndex, MergeKey, merge_strategy::ErasedOutcome, merge_strategy::MergeAction};
use crate::support;

/// Type-erased view of a queued item, as stored in the merge index.
pub(crate) trait PendingEvent: Send + Sync + 'static {
  fn is_invoked(&self) -> bool;
  fn try_absorb(&self, incoming: &dyn Any, action: &MergeAction) -> bool;
}

/// Where an item is linked in the merge index, for the one-time unlink.
pub(crate) struct IndexSlot {
  pub(crate) index:         ArcShared<MergeIndex>,
  pub(crate) listener_addr: usize,
  pub(crate) key:           MergeKey,
}

/// One pending broadcast invocation for one listener.
///
/// Holds the listener strongly so a weak registration cannot be collected
/// while a delivery for it is queued. Mergeable until
/// [`invoke`](Self::invoke) flips the flag; the flip unlinks the item from
/// the merge index before the listener method runs, so no internal lock is
/// held during user code.
pub struct QueuedEventItem<L: ?Sized, P> {
  listener:   ArcShared<L>,
  method:     EventMethod,
  params:     Mutex<Option<P>>,
  revision:   AtomicU64,
  invoked:    AtomicBool,
  index_slot: Mutex<Option<IndexSlot>>,
  deliver:    ArcShared<dyn Fn(&L, &P) + Send + Sync>,
}

impl<L, P> QueuedEventItem<L, P>
where
  L: ?Sized + Send + Sync + 'static,
  P: Any + Send,
{
  pub(crate) fn new(
    listener: ArcShared<L>,
    method: EventMethod,
    params: P,
    deliver: ArcShared<dyn Fn(&L, &P) + Send + Sync>,
  ) -> Self {
    Self {
      listener,
      method,
      params: Mutex::new(Some(params)),
      revision: AtomicU64::new(0),
      invoked: AtomicBool::new(false),
      index_slot: Mutex::new(None),
      deliver,
    }
  }

  /// The event method this item delivers.
  #[must_use]
  pub fn method(&self) -> EventMethod {
    self.method
  }

  /// Returns whether the item was already delivered (or is being delivered).
  #[must_use]
  pub fn is_invoked(&self) -> bool {
    self.invoked.load(Ordering::Acquire)
  }

  pub(crate) fn set_index_slot(&self, slot: IndexSlot) {
    *support::lock(&self.index_slot) = Some(slot);
  }

  /// Delivers the event to the listener; at most once.
  pub(crate) fn invoke(&self) {
    if self.invoked.swap(true, Ordering::AcqRel) {
      return;
    }
    if let Some(slot) = support::lock(&self.index_slot).take() {
      let item_addr = core::ptr::from_ref(self) as *const () as usize;
      slot.index.unlink(slot.listener_addr, &slot.key, item_addr);
    }
    let params = support::lock(&self.params).take();
    if let Some(params) = params {
      (self.deliver)(&self.listener, &params);
    }
  }
}

impl<L, P> PendingEvent for QueuedEventItem<L, P>
where
  L: ?Sized + Send + Sync + 'static,
  P: Any + Clone + Send,
{
  fn is_invoked(&self) -> bool {
    QueuedEventItem::is_invoked(self)
  }

  fn try_absorb(&self, incoming: &dyn Any, action: &MergeAction) -> bool {
    if self.is_invoked() {
      return false;
    }
    // Combiners are user code: they run against a snapshot with no internal
    // lock held, so a combiner that emits again never re-enters this mutex.
    let (queued, seen_revision) = {
      let params = support::lock(&self.params);
      let Some(queued) = params.as_ref() else {
        return false;
      };
      (queued.clone(), self.revision.load(Ordering::Acquire))
    };
    let replacement = match action.combine(&queued as &dyn Any, incoming) {
      | ErasedOutcome::Keep => None,
      | ErasedOutcome::Replace(replacement) => match replacement.downcast::<P>() {
        | Ok(replacement) => Some(*replacement),
        | Err(_) => return false,
      },
      | ErasedOutcome::Skip => return false,
    };
    let mut params = support::lock(&self.params);
    // Delivered or changed while the combiner ran: the snapshot is stale, so
    // the incoming event falls back to a separate delivery.
    if self.is_invoked() || params.is_none() || self.revision.load(Ordering::Acquire) != seen_revision {
      return false;
    }
    if let Some(replacement) = replacement {
      self.revision.fetch_add(1, Ordering::AcqRel);
      *params = Some(replacement);
    }
    true
  }
}
