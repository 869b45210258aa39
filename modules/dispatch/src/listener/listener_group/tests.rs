#![allow(clippy::unwrap_used, clippy::expect_used)]

use core::{
  sync::atomic::{AtomicBool, AtomicUsize, Ordering},
  time::Duration,
};
use std::{
  sync::{Arc, Mutex},
  thread,
};

use takt_utils_rs::sync::ArcShared;

use crate::{
  dispatcher::{Dispatcher, DispatcherRef},
  invoker::{InvokerConfig, SimpleAsyncInvoker},
  listener::{AliasKey, EventMethod, ListenerGroup, MergeKey, MergeOutcome, MergeStrategy},
  scheduler::{Scheduler, SchedulerRef},
};

const ON_CHANGE: EventMethod = EventMethod::new("on_change");

#[derive(Clone, Debug, PartialEq)]
struct Change {
  region: String,
  count:  usize,
}

trait ChangeListener: Send + Sync {
  fn on_change(&self, change: &Change);
}

struct Recorder {
  seen: Arc<Mutex<Vec<Change>>>,
}

impl ChangeListener for Recorder {
  fn on_change(&self, change: &Change) {
    self.seen.lock().unwrap().push(change.clone());
  }
}

fn runtime() -> (DispatcherRef, SchedulerRef) {
  let dispatcher = Dispatcher::new_ref();
  dispatcher.init(SimpleAsyncInvoker::new(InvokerConfig::new()).into_ref());
  let scheduler = Scheduler::new_ref(dispatcher.clone());
  (dispatcher, scheduler)
}

fn recorder() -> (ArcShared<dyn ChangeListener>, Arc<Mutex<Vec<Change>>>) {
  let seen = Arc::new(Mutex::new(Vec::new()));
  let listener =
    ArcShared::from_arc(Arc::new(Recorder { seen: Arc::clone(&seen) }) as Arc<dyn ChangeListener>);
  (listener, seen)
}

fn fire(group: &ListenerGroup<dyn ChangeListener>, region: &str) {
  group.emit(
    ON_CHANGE,
    Change { region: String::from(region), count: 1 },
    |listener, change| listener.on_change(change),
  );
}

fn counting_strategy() -> MergeStrategy {
  MergeStrategy::builder()
    .when::<Change>()
    .merge_by(|change| MergeKey::from(change.region.as_str()))
    .using(|queued, incoming| {
      MergeOutcome::Replace(Change { region: queued.region.clone(), count: queued.count + incoming.count })
    })
    .build()
}

#[test]
fn immediate_group_broadcasts_to_every_listener() {
  let (dispatcher, scheduler) = runtime();
  let group: ListenerGroup<dyn ChangeListener> = ListenerGroup::builder(dispatcher.clone()).build();
  let (first, first_seen) = recorder();
  let (second, second_seen) = recorder();

  group.add(first);
  group.add(second);
  fire(&group, "body");
  dispatcher.flush();

  assert_eq!(first_seen.lock().unwrap().len(), 1);
  assert_eq!(second_seen.lock().unwrap().len(), 1);
  scheduler.dispose();
  dispatcher.dispose();
}

#[test]
fn adding_twice_fires_twice() {
  let (dispatcher, scheduler) = runtime();
  let group: ListenerGroup<dyn ChangeListener> = ListenerGroup::builder(dispatcher.clone()).build();
  let (listener, seen) = recorder();

  group.add(listener.clone());
  group.add(listener.clone());
  assert_eq!(group.listener_count(), 2);
  assert!(group.is_listening(&listener));

  fire(&group, "body");
  dispatcher.flush();
  assert_eq!(seen.lock().unwrap().len(), 2);
  scheduler.dispose();
  dispatcher.dispose();
}

#[test]
fn removed_registration_stops_receiving() {
  let (dispatcher, scheduler) = runtime();
  let group: ListenerGroup<dyn ChangeListener> = ListenerGroup::builder(dispatcher.clone()).build();
  let (listener, seen) = recorder();

  let handle = group.add(listener.clone());
  handle.remove();
  handle.remove();
  assert!(!group.is_listening(&listener));
  assert_eq!(group.listener_count(), 0);

  fire(&group, "body");
  dispatcher.flush();
  assert!(seen.lock().unwrap().is_empty());
  scheduler.dispose();
  dispatcher.dispose();
}

#[test]
fn weak_listener_is_pruned_after_collection() {
  let (dispatcher, scheduler) = runtime();
  let group: ListenerGroup<dyn ChangeListener> = ListenerGroup::builder(dispatcher.clone()).build();
  let (listener, seen) = recorder();

  group.add_weak(&listener);
  fire(&group, "before");
  dispatcher.flush();
  assert_eq!(seen.lock().unwrap().len(), 1);

  drop(listener);
  fire(&group, "after");
  dispatcher.flush();

  assert_eq!(seen.lock().unwrap().len(), 1);
  assert_eq!(group.listener_count(), 0);
  scheduler.dispose();
  dispatcher.dispose();
}

#[test]
fn remove_all_alias_drops_every_matching_registration() {
  let (dispatcher, scheduler) = runtime();
  let group: ListenerGroup<dyn ChangeListener> = ListenerGroup::builder(dispatcher.clone()).build();
  let (first, first_seen) = recorder();
  let (second, second_seen) = recorder();
  let (third, third_seen) = recorder();

  group.add(first).alias(AliasKey::new().value(String::from("panel")));
  group.add(second).alias(AliasKey::new().value(String::from("panel")));
  group.add(third).alias(AliasKey::new().value(String::from("toolbar")));

  group.remove_all_alias(&AliasKey::new().value(String::from("panel")));
  assert_eq!(group.listener_count(), 1);

  fire(&group, "body");
  dispatcher.flush();
  assert!(first_seen.lock().unwrap().is_empty());
  assert!(second_seen.lock().unwrap().is_empty());
  assert_eq!(third_seen.lock().unwrap().len(), 1);
  scheduler.dispose();
  dispatcher.dispose();
}

#[test]
fn remove_all_clears_the_registry() {
  let (dispatcher, scheduler) = runtime();
  let group: ListenerGroup<dyn ChangeListener> = ListenerGroup::builder(dispatcher.clone()).build();
  let (first, first_seen) = recorder();
  let (second, _second_seen) = recorder();

  group.add(first);
  group.add(second);
  group.remove_all();
  assert_eq!(group.listener_count(), 0);

  fire(&group, "body");
  dispatcher.flush();
  assert!(first_seen.lock().unwrap().is_empty());
  scheduler.dispose();
  dispatcher.dispose();
}

#[test]
fn compatible_events_coalesce_before_delayed_delivery() {
  let (dispatcher, scheduler) = runtime();
  let group: ListenerGroup<dyn ChangeListener> = ListenerGroup::builder(dispatcher.clone())
    .with_scheduler(scheduler.clone())
    .with_merge_strategy(counting_strategy())
    .with_delay(Duration::from_millis(300))
    .build();
  let (listener, seen) = recorder();
  group.add(listener);

  fire(&group, "param");
  fire(&group, "param1");
  fire(&group, "param1");

  // "param1" merged into one pending item; "param" stands alone.
  assert_eq!(group.pending_event_count(), 2);

  thread::sleep(Duration::from_millis(600));
  dispatcher.flush();

  let seen = seen.lock().unwrap();
  assert_eq!(seen.len(), 2);
  let total: usize = seen.iter().map(|change| change.count).sum();
  assert_eq!(total, 3);
  assert!(seen.contains(&Change { region: String::from("param"), count: 1 }));
  assert!(seen.contains(&Change { region: String::from("param1"), count: 2 }));
  drop(seen);
  scheduler.dispose();
  dispatcher.dispose();
}

#[test]
fn a_combiner_may_emit_while_merging() {
  let (dispatcher, scheduler) = runtime();
  let group_slot: Arc<Mutex<Option<ArcShared<ListenerGroup<dyn ChangeListener>>>>> = Arc::new(Mutex::new(None));
  let reentered = Arc::new(AtomicBool::new(false));
  let strategy = {
    let group_slot = Arc::clone(&group_slot);
    let reentered = Arc::clone(&reentered);
    MergeStrategy::builder()
      .when::<Change>()
      .merge_by(|change| MergeKey::from(change.region.as_str()))
      .using(move |queued, incoming| {
        // A combiner that itself broadcasts on the same group and key; the
        // emitting thread must not block on its own pending item.
        if !reentered.swap(true, Ordering::SeqCst) {
          let group = group_slot.lock().unwrap().clone();
          if let Some(group) = group {
            group.emit(
              ON_CHANGE,
              Change { region: queued.region.clone(), count: 1 },
              |listener, change| listener.on_change(change),
            );
          }
        }
        MergeOutcome::Replace(Change { region: queued.region.clone(), count: queued.count + incoming.count })
      })
      .build()
  };
  let group = ArcShared::new(
    ListenerGroup::builder(dispatcher.clone())
      .with_scheduler(scheduler.clone())
      .with_merge_strategy(strategy)
      .with_delay(Duration::from_millis(300))
      .build(),
  );
  *group_slot.lock().unwrap() = Some(group.clone());
  let (listener, seen) = recorder();
  group.add(listener);

  fire(group.as_ref(), "slow");
  fire(group.as_ref(), "slow");

  thread::sleep(Duration::from_millis(700));
  dispatcher.flush();

  let seen = seen.lock().unwrap();
  let total: usize = seen.iter().map(|change| change.count).sum();
  assert_eq!(total, 3, "events were lost or duplicated: {seen:?}");
  drop(seen);
  scheduler.dispose();
  dispatcher.dispose();
}

#[test]
fn oversized_buckets_skip_the_merge_scan() {
  let (dispatcher, scheduler) = runtime();
  let combiner_calls = Arc::new(AtomicUsize::new(0));
  let strategy = {
    let combiner_calls = Arc::clone(&combiner_calls);
    MergeStrategy::builder()
      .when::<Change>()
      .merge_by(|_change| MergeKey::Unit)
      .using(move |_queued, _incoming| {
        combiner_calls.fetch_add(1, Ordering::SeqCst);
        MergeOutcome::Skip
      })
      .build()
  };
  let group: ListenerGroup<dyn ChangeListener> = ListenerGroup::builder(dispatcher.clone())
    .with_scheduler(scheduler.clone())
    .with_merge_strategy(strategy)
    .with_delay(Duration::from_millis(400))
    .build();
  let (listener, seen) = recorder();
  group.add(listener);

  for n in 0..101 {
    fire(&group, &format!("burst-{n}"));
  }
  assert_eq!(group.pending_event_count(), 101);

  // The bucket is past the scan cap: one more event bypasses the combiner
  // entirely and is still delivered, just unmerged.
  let calls_before = combiner_calls.load(Ordering::SeqCst);
  fire(&group, "straggler");
  assert_eq!(combiner_calls.load(Ordering::SeqCst), calls_before);
  assert_eq!(group.pending_event_count(), 102);

  thread::sleep(Duration::from_millis(900));
  dispatcher.flush();
  assert_eq!(seen.lock().unwrap().len(), 102);
  scheduler.dispose();
  dispatcher.dispose();
}

#[test]
fn events_for_different_listeners_never_merge() {
  let (dispatcher, scheduler) = runtime();
  let group: ListenerGroup<dyn ChangeListener> = ListenerGroup::builder(dispatcher.clone())
    .with_scheduler(scheduler.clone())
    .with_merge_strategy(counting_strategy())
    .with_delay(Duration::from_millis(200))
    .build();
  let (first, first_seen) = recorder();
  let (second, second_seen) = recorder();
  group.add(first);
  group.add(second);

  fire(&group, "shared");
  assert_eq!(group.pending_event_count(), 2);

  thread::sleep(Duration::from_millis(500));
  dispatcher.flush();
  assert_eq!(first_seen.lock().unwrap().len(), 1);
  assert_eq!(second_seen.lock().unwrap().len(), 1);
  scheduler.dispose();
  dispatcher.dispose();
}

#[test]
fn delivered_items_no_longer_absorb_events() {
  let (dispatcher, scheduler) = runtime();
  let group: ListenerGroup<dyn ChangeListener> = ListenerGroup::builder(dispatcher.clone())
    .with_scheduler(scheduler.clone())
    .with_merge_strategy(counting_strategy())
    .with_delay(Duration::from_millis(100))
    .build();
  let (listener, seen) = recorder();
  group.add(listener);

  fire(&group, "slow");
  thread::sleep(Duration::from_millis(400));
  dispatcher.flush();
  // The first burst was delivered; a new event starts a fresh item.
  fire(&group, "slow");
  thread::sleep(Duration::from_millis(400));
  dispatcher.flush();

  let seen = seen.lock().unwrap();
  assert_eq!(seen.len(), 2);
  assert!(seen.iter().all(|change| change.count == 1));
  drop(seen);
  scheduler.dispose();
  dispatcher.dispose();
}

#[test]
fn mismatched_parameter_types_bypass_the_strategy() {
  let (dispatcher, scheduler) = runtime();
  // The strategy only understands `Change`; other parameter types are
  // delivered one-to-one.
  let group: ListenerGroup<dyn ChangeListener> = ListenerGroup::builder(dispatcher.clone())
    .with_scheduler(scheduler.clone())
    .with_merge_strategy(counting_strategy())
    .with_delay(Duration::from_millis(100))
    .build();
  let count = Arc::new(Mutex::new(0_usize));
  let (listener, _seen) = recorder();
  group.add(listener);

  for _round in 0..3 {
    let count = Arc::clone(&count);
    group.emit(EventMethod::new("on_tick"), 7_u32, move |_listener, _tick| {
      *count.lock().unwrap() += 1;
    });
  }
  thread::sleep(Duration::from_millis(400));
  dispatcher.flush();

  assert_eq!(*count.lock().unwrap(), 3);
  scheduler.dispose();
  dispatcher.dispose();
}

#[cfg(debug_assertions)]
#[test]
fn groups_register_in_the_leak_registry_while_alive() {
  let (dispatcher, scheduler) = runtime();
  let before = crate::listener::live_group_count();
  {
    let _group: ListenerGroup<dyn ChangeListener> = ListenerGroup::builder(dispatcher.clone()).build();
    assert_eq!(crate::listener::live_group_count(), before + 1);
  }
  assert_eq!(crate::listener::live_group_count(), before);
  scheduler.dispose();
  dispatcher.dispose();
}
