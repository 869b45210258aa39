use super::DispatchFailure;

/// Receives every failure caught by the runtime's run loops.
pub trait FailureSink: Send + Sync + 'static {
  /// Called from the run loop that caught the failure.
  ///
  /// Implementations must not panic and should return promptly; they execute
  /// on the dispatch or scheduler thread.
  fn on_failure(&self, failure: DispatchFailure);
}

impl<F> FailureSink for F
where
  F: Fn(DispatchFailure) + Send + Sync + 'static,
{
  fn on_failure(&self, failure: DispatchFailure) {
    (self)(failure);
  }
}
