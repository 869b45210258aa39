use core::{marker::PhantomData, time::Duration};

use super::{ListenerGroup, MergeStrategy};
use crate::{dispatcher::DispatcherRef, scheduler::SchedulerRef};

/// Builder for [`ListenerGroup`]; created by
/// [`ListenerGroup::builder`](super::ListenerGroup::builder).
pub struct ListenerGroupBuilder<L: ?Sized + Send + Sync + 'static> {
  dispatcher: DispatcherRef,
  scheduler:  Option<SchedulerRef>,
  strategy:   Option<MergeStrategy>,
  delay:      Duration,
  _listener:  PhantomData<fn(&L)>,
}

impl<L: ?Sized + Send + Sync + 'static> ListenerGroupBuilder<L> {
  pub(crate) fn new(dispatcher: DispatcherRef) -> Self {
    Self { dispatcher, scheduler: None, strategy: None, delay: Duration::ZERO, _listener: PhantomData }
  }

  /// Routes deliveries through `scheduler`; required for a non-zero delay.
  #[must_use]
  pub fn with_scheduler(mut self, scheduler: SchedulerRef) -> Self {
    self.scheduler = Some(scheduler);
    self
  }

  /// Coalesces compatible pending events according to `strategy`.
  #[must_use]
  pub fn with_merge_strategy(mut self, strategy: MergeStrategy) -> Self {
    self.strategy = Some(strategy);
    self
  }

  /// Delays every delivery by the grace period, giving later compatible
  /// events a chance to merge before anything reaches a listener.
  #[must_use]
  pub fn with_delay(mut self, delay: Duration) -> Self {
    self.delay = delay;
    self
  }

  /// Builds the group.
  ///
  /// # Panics
  ///
  /// Panics when a non-zero delay was configured without a scheduler.
  #[must_use]
  pub fn build(self) -> ListenerGroup<L> {
    assert!(self.delay.is_zero() || self.scheduler.is_some(), "a delayed listener group needs a scheduler");
    let delay_millis = u64::try_from(self.delay.as_millis()).unwrap_or(u64::MAX);
    ListenerGroup::from_parts(self.dispatcher, self.scheduler, self.strategy, delay_millis)
  }
}
