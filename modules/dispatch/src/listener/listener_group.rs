use core::any::Any;
use std::sync::{Arc, Mutex};

use takt_utils_rs::sync::ArcShared;

use super::{
  EventMethod, ListenerGroupBuilder, ListenerHandle, MergeIndex, MergeKey, MergeStrategy,
  alias_key::AliasKey,
  listener_registration::ListenerRegistration,
  queued_event_item::{IndexSlot, PendingEvent, QueuedEventItem},
};
use crate::{dispatcher::DispatcherRef, scheduler::SchedulerRef, support};

#[cfg(test)]
mod tests;

const LOG_TARGET: &str = "takt::dispatch::listener";

/// Broadcast registry for one capability interface.
///
/// A hand-written broadcaster type per capability interface owns one group:
/// its management methods (`add`, `remove_all`, ...) forward to the group's
/// registry, and each event method calls [`emit`](Self::emit) with its
/// parameters and a delivery closure. Deliveries run on the dispatch thread,
/// immediately when the group's delay is zero, or after the grace period via
/// the scheduler so later compatible events can coalesce first.
pub struct ListenerGroup<L: ?Sized + Send + Sync + 'static> {
  pub(super) dispatcher:   DispatcherRef,
  pub(super) scheduler:    Option<SchedulerRef>,
  pub(super) strategy:     Option<MergeStrategy>,
  pub(super) delay_millis: u64,
  pub(super) registry:     Mutex<Vec<ArcShared<ListenerRegistration<L>>>>,
  pub(super) merge_index:  ArcShared<MergeIndex>,
  #[cfg(debug_assertions)]
  pub(super) _leak_token:  super::leak_registry::LeakToken,
}

impl<L: ?Sized + Send + Sync + 'static> ListenerGroup<L> {
  /// Starts building a group delivering through `dispatcher`.
  #[must_use]
  pub fn builder(dispatcher: DispatcherRef) -> ListenerGroupBuilder<L> {
    ListenerGroupBuilder::new(dispatcher)
  }

  pub(super) fn from_parts(
    dispatcher: DispatcherRef,
    scheduler: Option<SchedulerRef>,
    strategy: Option<MergeStrategy>,
    delay_millis: u64,
  ) -> Self {
    Self {
      dispatcher,
      scheduler,
      strategy,
      delay_millis,
      registry: Mutex::new(Vec::new()),
      merge_index: ArcShared::new(MergeIndex::new()),
      #[cfg(debug_assertions)]
      _leak_token: super::leak_registry::LeakToken::register(core::any::type_name::<L>()),
    }
  }

  /// Registers a listener, holding it strongly.
  pub fn add(&self, listener: ArcShared<L>) -> ListenerHandle<L> {
    let registration = ArcShared::new(ListenerRegistration::strong(listener));
    support::lock(&self.registry).push(registration.clone());
    ListenerHandle::new(registration)
  }

  /// Registers a listener without extending its lifetime.
  ///
  /// Once every other strong reference is gone the registration is pruned on
  /// the next broadcast; no explicit remove is needed.
  pub fn add_weak(&self, listener: &ArcShared<L>) -> ListenerHandle<L> {
    let registration = ArcShared::new(ListenerRegistration::weak(listener));
    support::lock(&self.registry).push(registration.clone());
    ListenerHandle::new(registration)
  }

  /// Removes every registration.
  pub fn remove_all(&self) {
    let mut registry = support::lock(&self.registry);
    for registration in registry.iter() {
      registration.mark_removed();
    }
    registry.clear();
  }

  /// Removes every registration carrying an alias matching `alias`.
  pub fn remove_all_alias(&self, alias: &AliasKey) {
    let mut registry = support::lock(&self.registry);
    registry.retain(|registration| {
      if registration.has_alias(alias) {
        registration.mark_removed();
      }
      !registration.is_defunct()
    });
  }

  /// Returns whether at least one live registration targets `listener`.
  #[must_use]
  pub fn is_listening(&self, listener: &ArcShared<L>) -> bool {
    support::lock(&self.registry)
      .iter()
      .filter_map(|registration| registration.live_target())
      .any(|target| target.ptr_eq(listener))
  }

  /// Number of live registrations; dead entries are pruned on the way.
  #[must_use]
  pub fn listener_count(&self) -> usize {
    let mut registry = support::lock(&self.registry);
    registry.retain(|registration| !registration.is_defunct());
    registry.iter().filter(|registration| registration.live_target().is_some()).count()
  }

  /// Not-yet-delivered queued events across all listeners of the group.
  #[must_use]
  pub fn pending_event_count(&self) -> usize {
    self.merge_index.pending_len()
  }

  /// Broadcasts one event-method invocation to every live listener.
  ///
  /// Per listener the event first tries to merge into a pending compatible
  /// delivery; otherwise a fresh [`QueuedEventItem`] is enqueued. The
  /// registry lock is released before any queueing or user code runs.
  pub fn emit<P>(&self, method: EventMethod, params: P, deliver: impl Fn(&L, &P) + Send + Sync + 'static)
  where
    P: Any + Clone + Send, {
    let deliver: ArcShared<dyn Fn(&L, &P) + Send + Sync> =
      ArcShared::from_arc(Arc::new(deliver) as Arc<dyn Fn(&L, &P) + Send + Sync>);
    let targets = {
      let mut registry = support::lock(&self.registry);
      registry.retain(|registration| !registration.is_defunct());
      registry.iter().filter_map(|registration| registration.live_target()).collect::<Vec<_>>()
    };
    for listener in targets {
      self.deliver_one(listener, method, &params, &deliver);
    }
  }

  fn deliver_one<P>(
    &self,
    listener: ArcShared<L>,
    method: EventMethod,
    params: &P,
    deliver: &ArcShared<dyn Fn(&L, &P) + Send + Sync>,
  ) where
    P: Any + Clone + Send, {
    if let Some(strategy) = &self.strategy {
      for action in strategy.actions() {
        let Some(key) = action.key_for(&method, params) else {
          continue;
        };
        if self.merge_index.try_merge(listener.addr(), &key, params, action) {
          return;
        }
        self.enqueue(listener, method, params.clone(), deliver.clone(), Some(key));
        return;
      }
    }
    self.enqueue(listener, method, params.clone(), deliver.clone(), None);
  }

  fn enqueue<P>(
    &self,
    listener: ArcShared<L>,
    method: EventMethod,
    params: P,
    deliver: ArcShared<dyn Fn(&L, &P) + Send + Sync>,
    key: Option<MergeKey>,
  ) where
    P: Any + Clone + Send, {
    let listener_addr = listener.addr();
    let item = ArcShared::new(QueuedEventItem::new(listener, method, params, deliver));
    if let Some(key) = key {
      let erased: ArcShared<dyn PendingEvent> =
        ArcShared::from_arc(item.clone().into_arc() as Arc<dyn PendingEvent>);
      item.set_index_slot(IndexSlot { index: self.merge_index.clone(), listener_addr, key: key.clone() });
      self.merge_index.link(listener_addr, key, erased.downgrade());
    }
    let run = {
      let item = item.clone();
      move || item.invoke()
    };
    match (&self.scheduler, self.delay_millis) {
      | (Some(scheduler), delay) if delay > 0 => {
        scheduler.schedule(run, scheduler.clock().now_millis() + delay);
      },
      | _ => {
        if self.dispatcher.dispatch(run).is_err() {
          tracing::warn!(target: LOG_TARGET, method = method.name(), "dropping event: dispatcher is not initialized");
        }
      },
    }
  }
}
