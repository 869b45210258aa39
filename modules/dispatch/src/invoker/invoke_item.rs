use std::{panic, panic::AssertUnwindSafe, sync::Mutex};

use takt_utils_rs::concurrent::CountDownLatch;

use super::InvokerTask;
use crate::{failure::FailurePayload, support};

/// One queued unit of work plus its completion bookkeeping.
///
/// `dispatch`-style items carry no completion signal; `call`-style items own
/// a latch the submitting thread blocks on, and a slot through which the
/// task's original panic payload travels back to that thread.
pub(crate) struct InvokeItem {
  task:       Mutex<Option<InvokerTask>>,
  completion: Option<CountDownLatch>,
  failure:    Mutex<Option<FailurePayload>>,
}

impl InvokeItem {
  /// Creates a fire-and-forget item.
  pub(crate) fn fire(task: InvokerTask) -> Self {
    Self { task: Mutex::new(Some(task)), completion: None, failure: Mutex::new(None) }
  }

  /// Creates an item whose submitter blocks until completion.
  pub(crate) fn awaited(task: InvokerTask) -> Self {
    Self { task: Mutex::new(Some(task)), completion: Some(CountDownLatch::new(1)), failure: Mutex::new(None) }
  }

  pub(crate) fn is_awaited(&self) -> bool {
    self.completion.is_some()
  }

  /// Runs the task at most once and returns the payload destined for the
  /// failure sink.
  ///
  /// For awaited items the original payload is reserved for the blocked
  /// caller (so `call` re-raises the exact value) and the sink receives a
  /// message-level copy. The blocked caller stays parked until
  /// [`finish`](Self::finish), which the executor calls once the sink has
  /// seen the failure.
  pub(crate) fn run(&self) -> Option<FailurePayload> {
    let task = support::lock(&self.task).take();
    match task {
      | None => None,
      | Some(task) => match panic::catch_unwind(AssertUnwindSafe(task)) {
        | Ok(()) => None,
        | Err(caught) => {
          let payload = FailurePayload::new(caught);
          if self.is_awaited() {
            let copy = FailurePayload::from_message(payload.describe());
            *support::lock(&self.failure) = Some(payload);
            Some(copy)
          } else {
            Some(payload)
          }
        },
      },
    }
  }

  /// Releases the blocked submitter, if any.
  pub(crate) fn finish(&self) {
    if let Some(latch) = &self.completion {
      latch.count_down();
    }
  }

  /// Returns whether the item already ran (successfully or not).
  pub(crate) fn is_complete(&self) -> bool {
    match &self.completion {
      | Some(latch) => latch.count() == 0,
      | None => support::lock(&self.task).is_none(),
    }
  }

  /// Blocks until the item completed.
  pub(crate) fn wait(&self) {
    if let Some(latch) = &self.completion {
      latch.wait();
    }
  }

  /// Takes the payload reserved for the blocked caller.
  pub(crate) fn take_failure(&self) -> Option<FailurePayload> {
    support::lock(&self.failure).take()
  }
}
