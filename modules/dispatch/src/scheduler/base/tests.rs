#![allow(clippy::unwrap_used, clippy::expect_used)]

use core::{
  sync::atomic::{AtomicBool, AtomicU64, Ordering},
  time::Duration,
};
use std::{
  sync::{Arc, Mutex},
  thread,
};

use takt_utils_rs::concurrent::CountDownLatch;

use crate::{
  dispatcher::{Dispatcher, DispatcherRef},
  invoker::{InvokerConfig, SimpleAsyncInvoker},
  scheduler::Scheduler,
};

fn installed_dispatcher() -> DispatcherRef {
  let dispatcher = Dispatcher::new_ref();
  dispatcher.init(SimpleAsyncInvoker::new(InvokerConfig::new()).into_ref());
  dispatcher
}

#[test]
fn due_item_fires_on_the_dispatch_thread() {
  let dispatcher = installed_dispatcher();
  let scheduler = Scheduler::new(dispatcher.clone());
  let fired = Arc::new(CountDownLatch::new(1));
  let on_dispatch_thread = Arc::new(AtomicBool::new(false));

  let handle = {
    let fired = Arc::clone(&fired);
    let on_dispatch_thread = Arc::clone(&on_dispatch_thread);
    let probe = dispatcher.clone();
    scheduler.schedule(
      move || {
        on_dispatch_thread.store(probe.is_dispatch_thread(), Ordering::SeqCst);
        fired.count_down();
      },
      scheduler.clock().now_millis() + 20,
    )
  };

  assert!(fired.wait_timeout(Duration::from_secs(5)));
  assert!(on_dispatch_thread.load(Ordering::SeqCst));
  assert!(handle.has_fired());
  scheduler.dispose();
  dispatcher.dispose();
}

#[test]
fn cancelled_item_never_runs() {
  let dispatcher = installed_dispatcher();
  let scheduler = Scheduler::new(dispatcher.clone());
  let ran = Arc::new(AtomicBool::new(false));

  let handle = {
    let ran = Arc::clone(&ran);
    scheduler.schedule(move || ran.store(true, Ordering::SeqCst), scheduler.clock().now_millis() + 500)
  };
  thread::sleep(Duration::from_millis(50));
  scheduler.cancel(&handle);
  assert!(handle.is_cancelled());

  thread::sleep(Duration::from_millis(600));
  dispatcher.flush();
  assert!(!ran.load(Ordering::SeqCst));
  scheduler.dispose();
  dispatcher.dispose();
}

#[test]
fn cancel_is_idempotent_and_harmless_after_firing() {
  let dispatcher = installed_dispatcher();
  let scheduler = Scheduler::new(dispatcher.clone());
  let fired = Arc::new(CountDownLatch::new(1));

  let handle = {
    let fired = Arc::clone(&fired);
    scheduler.schedule(move || fired.count_down(), scheduler.clock().now_millis() + 10)
  };
  assert!(fired.wait_timeout(Duration::from_secs(5)));

  scheduler.cancel(&handle);
  scheduler.cancel(&handle);
  assert!(handle.has_fired());
  assert!(!handle.is_cancelled());
  scheduler.dispose();
  dispatcher.dispose();
}

#[test]
fn rescheduled_item_fires_at_the_new_time() {
  let dispatcher = installed_dispatcher();
  let scheduler = Scheduler::new(dispatcher.clone());
  let fired = Arc::new(CountDownLatch::new(1));
  let fired_at = Arc::new(AtomicU64::new(0));
  let start = scheduler.clock().now_millis();

  let handle = {
    let fired = Arc::clone(&fired);
    let fired_at = Arc::clone(&fired_at);
    let clock = scheduler.clock();
    scheduler.schedule(
      move || {
        fired_at.store(clock.now_millis(), Ordering::SeqCst);
        fired.count_down();
      },
      start + 1_000,
    )
  };
  scheduler.reschedule(&handle, start + 300);

  assert!(fired.wait_timeout(Duration::from_secs(5)));
  let elapsed = fired_at.load(Ordering::SeqCst).saturating_sub(start);
  assert!(elapsed >= 290, "fired after {elapsed}ms");
  assert!(elapsed < 900, "fired after {elapsed}ms, not at the new time");
  scheduler.dispose();
  dispatcher.dispose();
}

#[test]
fn reschedule_after_firing_is_a_no_op() {
  let dispatcher = installed_dispatcher();
  let scheduler = Scheduler::new(dispatcher.clone());
  let fired = Arc::new(CountDownLatch::new(1));

  let handle = {
    let fired = Arc::clone(&fired);
    scheduler.schedule(move || fired.count_down(), scheduler.clock().now_millis() + 10)
  };
  assert!(fired.wait_timeout(Duration::from_secs(5)));

  scheduler.reschedule(&handle, scheduler.clock().now_millis() + 10_000);
  assert!(handle.has_fired());
  scheduler.dispose();
  dispatcher.dispose();
}

#[test]
fn same_time_entries_fire_in_insertion_order() {
  let dispatcher = installed_dispatcher();
  let scheduler = Scheduler::new(dispatcher.clone());
  let order = Arc::new(Mutex::new(Vec::new()));
  let done = Arc::new(CountDownLatch::new(3));
  let when = scheduler.clock().now_millis() + 100;

  for label in ["first", "second", "third"] {
    let order = Arc::clone(&order);
    let done = Arc::clone(&done);
    scheduler.schedule(
      move || {
        order.lock().unwrap().push(label);
        done.count_down();
      },
      when,
    );
  }

  assert!(done.wait_timeout(Duration::from_secs(5)));
  assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
  scheduler.dispose();
  dispatcher.dispose();
}

#[test]
fn firing_without_an_initialized_dispatcher_drops_the_item() {
  let dispatcher = Dispatcher::new_ref();
  let scheduler = Scheduler::new(dispatcher.clone());

  let handle = scheduler.schedule(|| panic!("must never run"), scheduler.clock().now_millis() + 10);
  thread::sleep(Duration::from_millis(100));

  // The scheduler claimed the fire transition, then found nowhere to deliver.
  assert!(handle.has_fired());
  scheduler.dispose();
}

#[test]
fn dispose_stops_the_thread_and_drops_pending_entries() {
  let dispatcher = installed_dispatcher();
  let scheduler = Scheduler::new(dispatcher.clone());
  let ran = Arc::new(AtomicBool::new(false));

  {
    let ran = Arc::clone(&ran);
    scheduler.schedule(move || ran.store(true, Ordering::SeqCst), scheduler.clock().now_millis() + 200);
  }
  scheduler.dispose();
  scheduler.dispose();

  thread::sleep(Duration::from_millis(300));
  dispatcher.flush();
  assert!(!ran.load(Ordering::SeqCst));
  dispatcher.dispose();
}

#[test]
fn earlier_entry_overtakes_a_later_one() {
  let dispatcher = installed_dispatcher();
  let scheduler = Scheduler::new(dispatcher.clone());
  let order = Arc::new(Mutex::new(Vec::new()));
  let done = Arc::new(CountDownLatch::new(2));
  let start = scheduler.clock().now_millis();

  for (label, offset) in [("late", 200_u64), ("early", 50)] {
    let order = Arc::clone(&order);
    let done = Arc::clone(&done);
    scheduler.schedule(
      move || {
        order.lock().unwrap().push(label);
        done.count_down();
      },
      start + offset,
    );
  }

  assert!(done.wait_timeout(Duration::from_secs(5)));
  assert_eq!(*order.lock().unwrap(), vec!["early", "late"]);
  scheduler.dispose();
  dispatcher.dispose();
}

#[test]
fn items_scheduled_in_the_past_fire_immediately() {
  let dispatcher = installed_dispatcher();
  let scheduler = Scheduler::new(dispatcher.clone());
  let fired = Arc::new(CountDownLatch::new(1));

  {
    let fired = Arc::clone(&fired);
    scheduler.schedule(move || fired.count_down(), scheduler.clock().now_millis().saturating_sub(1_000));
  }
  assert!(fired.wait_timeout(Duration::from_secs(5)));
  scheduler.dispose();
  dispatcher.dispose();
}
