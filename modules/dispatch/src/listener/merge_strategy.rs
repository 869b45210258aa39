use core::any::Any;

use super::{EventMethod, MergeKey, MergeOutcome};


type KeySelector = dyn Fn(&EventMethod, &dyn Any) -> Option<MergeKey> + Send + Sync;
type Combiner = dyn Fn(&dyn Any, &dyn Any) -> ErasedOutcome + Send + Sync;

/// Type-erased [`MergeOutcome`], carrying replacement parameters boxed.
pub(crate) enum ErasedOutcome {
  Keep,
  Replace(Box<dyn Any + Send>),
  Skip,
}

/// One coalescing rule: a parameter-type condition, a group-key selector, and
/// a pairwise combiner.
pub(crate) struct MergeAction {
  key_for: Box<KeySelector>,
  combine: Box<Combiner>,
}

impl MergeAction {
  /// Returns the group key when this action applies to the event, else `None`.
  pub(crate) fn key_for(&self, method: &EventMethod, params: &dyn Any) -> Option<MergeKey> {
    (self.key_for)(method, params)
  }

  /// Asks the combiner to fold `incoming` into `queued`.
  pub(crate) fn combine(&self, queued: &dyn Any, incoming: &dyn Any) -> ErasedOutcome {
    (self.combine)(queued, incoming)
  }
}

/// Ordered list of coalescing rules for one listener group.
///
/// For every emitted event the first action whose condition applies decides
/// the group key; pending events for the same listener and key are then asked
/// to absorb the new one in queue-insertion order. Combiners may be
/// order-dependent; the strategy preserves that order rather than imposing
/// associativity.
pub struct MergeStrategy {
  actions: Vec<MergeAction>,
}

impl MergeStrategy {
  /// Starts building a strategy.
  #[must_use]
  pub fn builder() -> MergeStrategyBuilder {
    MergeStrategyBuilder { actions: Vec::new() }
  }

  pub(crate) fn actions(&self) -> &[MergeAction] {
    &self.actions
  }
}

impl core::fmt::Debug for MergeStrategy {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("MergeStrategy").field("actions", &self.actions.len()).finish()
  }
}

/// Builder accumulating [`MergeStrategy`] rules.
pub struct MergeStrategyBuilder {
  actions: Vec<MergeAction>,
}

impl MergeStrategyBuilder {
  /// Starts a rule applying to events whose parameter type is `P`.
  #[must_use]
  pub fn when<P: Any + Send>(self) -> MergeActionBuilder<P> {
    MergeActionBuilder { parent: self, method: None, _params: core::marker::PhantomData }
  }

  /// Finishes the strategy.
  #[must_use]
  pub fn build(self) -> MergeStrategy {
    MergeStrategy { actions: self.actions }
  }
}

/// Builder for one rule; created by [`MergeStrategyBuilder::when`].
pub struct MergeActionBuilder<P> {
  parent:  MergeStrategyBuilder,
  method:  Option<EventMethod>,
  _params: core::marker::PhantomData<fn(P)>,
}

impl<P: Any + Send> MergeActionBuilder<P> {
  /// Restricts the rule to one event method; without this it applies to every
  /// method whose parameter type is `P`.
  #[must_use]
  pub fn on(mut self, method: EventMethod) -> Self {
    self.method = Some(method);
    self
  }

  /// Sets the group-key selector and moves on to the combiner.
  #[must_use]
  pub fn merge_by<K>(self, selector: impl Fn(&P) -> K + Send + Sync + 'static) -> MergeCombinerBuilder<P>
  where
    K: Into<MergeKey>, {
    let method_filter = self.method;
    let key_for = Box::new(move |method: &EventMethod, params: &dyn Any| {
      if method_filter.is_some_and(|filter| filter != *method) {
        return None;
      }
      params.downcast_ref::<P>().map(|params| selector(params).into())
    });
    MergeCombinerBuilder { parent: self.parent, key_for, _params: core::marker::PhantomData }
  }
}

/// Final step of one rule; created by [`MergeActionBuilder::merge_by`].
pub struct MergeCombinerBuilder<P> {
  parent:  MergeStrategyBuilder,
  key_for: Box<KeySelector>,
  _params: core::marker::PhantomData<fn(P)>,
}

impl<P: Any + Send> MergeCombinerBuilder<P> {
  /// Sets the pairwise combiner and returns to the strategy builder.
  ///
  /// The combiner receives the queued parameters first and the incoming ones
  /// second.
  #[must_use]
  pub fn using(self, combiner: impl Fn(&P, &P) -> MergeOutcome<P> + Send + Sync + 'static) -> MergeStrategyBuilder {
    let combine = Box::new(move |queued: &dyn Any, incoming: &dyn Any| {
      let (Some(queued), Some(incoming)) = (queued.downcast_ref::<P>(), incoming.downcast_ref::<P>()) else {
        return ErasedOutcome::Skip;
      };
      match combiner(queued, incoming) {
        | MergeOutcome::Keep => ErasedOutcome::Keep,
        | MergeOutcome::Replace(params) => ErasedOutcome::Replace(Box::new(params)),
        | MergeOutcome::Skip => ErasedOutcome::Skip,
      }
    });
    let mut parent = self.parent;
    parent.actions.push(MergeAction { key_for: self.key_for, combine });
    parent
  }
}
