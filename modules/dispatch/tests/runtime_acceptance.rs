//! End-to-end checks across invoker, dispatcher, scheduler, and listeners,
//! including a hand-written broadcaster the way application code declares one
//! per capability interface.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use core::time::Duration;
use std::{
  sync::{Arc, Mutex},
  thread,
};

use takt_dispatch_rs::{
  dispatcher::{Dispatcher, DispatcherRef},
  invoker::{InvokerConfig, SimpleAsyncInvoker},
  listener::{EventMethod, ListenerGroup, ListenerHandle, MergeKey, MergeOutcome, MergeStrategy},
  scheduler::{Scheduler, SchedulerRef},
};
use takt_utils_rs::{concurrent::CountDownLatch, sync::ArcShared};

#[derive(Clone, Debug, PartialEq)]
struct RegionChange {
  region: String,
  count:  usize,
}

trait DocumentListener: Send + Sync {
  fn region_changed(&self, change: &RegionChange);
}

/// Broadcaster for [`DocumentListener`]: management methods forward to the
/// group, the event method broadcasts.
struct DocumentEvents {
  group: ListenerGroup<dyn DocumentListener>,
}

impl DocumentEvents {
  const REGION_CHANGED: EventMethod = EventMethod::new("region_changed");

  fn immediate(dispatcher: DispatcherRef) -> Self {
    Self { group: ListenerGroup::builder(dispatcher).build() }
  }

  fn coalescing(dispatcher: DispatcherRef, scheduler: SchedulerRef, delay: Duration) -> Self {
    let strategy = MergeStrategy::builder()
      .when::<RegionChange>()
      .merge_by(|change| MergeKey::from(change.region.as_str()))
      .using(|queued, incoming| {
        MergeOutcome::Replace(RegionChange {
          region: queued.region.clone(),
          count:  queued.count + incoming.count,
        })
      })
      .build();
    Self {
      group: ListenerGroup::builder(dispatcher)
        .with_scheduler(scheduler)
        .with_merge_strategy(strategy)
        .with_delay(delay)
        .build(),
    }
  }

  fn add(&self, listener: ArcShared<dyn DocumentListener>) -> ListenerHandle<dyn DocumentListener> {
    self.group.add(listener)
  }

  fn region_changed(&self, change: RegionChange) {
    self.group.emit(Self::REGION_CHANGED, change, |listener, change| listener.region_changed(change));
  }
}

struct Recorder {
  seen: Arc<Mutex<Vec<RegionChange>>>,
}

impl DocumentListener for Recorder {
  fn region_changed(&self, change: &RegionChange) {
    self.seen.lock().unwrap().push(change.clone());
  }
}

fn recorder() -> (ArcShared<dyn DocumentListener>, Arc<Mutex<Vec<RegionChange>>>) {
  let seen = Arc::new(Mutex::new(Vec::new()));
  let listener =
    ArcShared::from_arc(Arc::new(Recorder { seen: Arc::clone(&seen) }) as Arc<dyn DocumentListener>);
  (listener, seen)
}

fn change(region: &str) -> RegionChange {
  RegionChange { region: String::from(region), count: 1 }
}

#[test]
fn broadcaster_delivers_in_submission_order() {
  let dispatcher = Dispatcher::new_ref();
  dispatcher.init(SimpleAsyncInvoker::new(InvokerConfig::new()).into_ref());
  let events = DocumentEvents::immediate(dispatcher.clone());
  let (listener, seen) = recorder();
  events.add(listener);

  events.region_changed(change("header"));
  events.region_changed(change("body"));
  events.region_changed(change("footer"));
  dispatcher.flush();

  let regions: Vec<String> = seen.lock().unwrap().iter().map(|c| c.region.clone()).collect();
  assert_eq!(regions, vec!["header", "body", "footer"]);
  dispatcher.dispose();
}

#[test]
fn coalescing_broadcaster_bounds_fanout() {
  let dispatcher = Dispatcher::new_ref();
  dispatcher.init(SimpleAsyncInvoker::new(InvokerConfig::new()).into_ref());
  let scheduler = Scheduler::new_ref(dispatcher.clone());
  let events = DocumentEvents::coalescing(dispatcher.clone(), scheduler.clone(), Duration::from_millis(200));
  let (listener, seen) = recorder();
  events.add(listener);

  for _burst in 0..5 {
    events.region_changed(change("body"));
  }
  thread::sleep(Duration::from_millis(600));
  dispatcher.flush();

  let seen = seen.lock().unwrap();
  assert_eq!(seen.len(), 1, "burst was not coalesced: {seen:?}");
  assert_eq!(seen[0], RegionChange { region: String::from("body"), count: 5 });
  drop(seen);
  scheduler.dispose();
  dispatcher.dispose();
}

#[test]
fn rescheduled_delivery_targets_current_invoker() {
  let dispatcher = Dispatcher::new_ref();
  dispatcher.init(SimpleAsyncInvoker::new(InvokerConfig::new().with_name("takt-alpha")).into_ref());
  let scheduler = Scheduler::new_ref(dispatcher.clone());

  let fired = Arc::new(CountDownLatch::new(1));
  let fired_on = Arc::new(Mutex::new(None::<String>));
  {
    let fired = Arc::clone(&fired);
    let fired_on = Arc::clone(&fired_on);
    scheduler.schedule(
      move || {
        *fired_on.lock().unwrap() = thread::current().name().map(String::from);
        fired.count_down();
      },
      scheduler.clock().now_millis() + 250,
    );
  }

  // Swap the invoker while the delivery is in flight; firing resolves the
  // dispatcher's current invoker, not the one installed at schedule time.
  thread::sleep(Duration::from_millis(50));
  dispatcher.init(SimpleAsyncInvoker::new(InvokerConfig::new().with_name("takt-beta")).into_ref());

  assert!(fired.wait_timeout(Duration::from_secs(5)));
  assert_eq!(fired_on.lock().unwrap().as_deref(), Some("takt-beta"));
  scheduler.dispose();
  dispatcher.dispose();
}

#[test]
fn scheduled_work_and_broadcasts_share_the_dispatch_thread() {
  let dispatcher = Dispatcher::new_ref();
  dispatcher.init(SimpleAsyncInvoker::new(InvokerConfig::new()).into_ref());
  let scheduler = Scheduler::new_ref(dispatcher.clone());
  let events = DocumentEvents::immediate(dispatcher.clone());

  let order = Arc::new(Mutex::new(Vec::new()));
  let done = Arc::new(CountDownLatch::new(2));

  let (listener, _seen) = recorder();
  events.add(listener);
  {
    let order = Arc::clone(&order);
    let done = Arc::clone(&done);
    let probe = dispatcher.clone();
    scheduler.schedule(
      move || {
        assert!(probe.is_dispatch_thread());
        order.lock().unwrap().push("scheduled");
        done.count_down();
      },
      scheduler.clock().now_millis() + 50,
    );
  }
  {
    let order = Arc::clone(&order);
    let done = Arc::clone(&done);
    let probe = dispatcher.clone();
    events.group.emit(EventMethod::new("probe"), (), move |_listener, _unit| {
      assert!(probe.is_dispatch_thread());
      order.lock().unwrap().push("broadcast");
      done.count_down();
    });
  }

  assert!(done.wait_timeout(Duration::from_secs(5)));
  assert_eq!(order.lock().unwrap().len(), 2);
  scheduler.dispose();
  dispatcher.dispose();
}
