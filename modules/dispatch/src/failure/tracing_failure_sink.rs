use tracing::{Level, event};

use super::{DispatchFailure, FailureSink};

/// Default sink that reports failures through the `tracing` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingFailureSink;

impl TracingFailureSink {
  /// Target name used in emitted events.
  pub const DEFAULT_TARGET: &'static str = "takt::dispatch::failure";
}

impl FailureSink for TracingFailureSink {
  fn on_failure(&self, failure: DispatchFailure) {
    event!(
      target: TracingFailureSink::DEFAULT_TARGET,
      Level::ERROR,
      origin = %failure.origin(),
      "{}",
      failure.payload()
    );
  }
}
