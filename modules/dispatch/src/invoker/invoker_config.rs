use takt_utils_rs::sync::ArcShared;

use crate::failure::{FailureSink, TracingFailureSink};

/// Construction parameters for a [`SimpleAsyncInvoker`](super::SimpleAsyncInvoker).
#[derive(Clone)]
pub struct InvokerConfig {
  name: String,
  sink: ArcShared<dyn FailureSink>,
}

impl InvokerConfig {
  /// Creates a configuration with the default thread name and tracing sink.
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Assigns the worker thread name.
  #[must_use]
  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.name = name.into();
    self
  }

  /// Assigns the sink receiving failures caught by the worker loop.
  #[must_use]
  pub fn with_sink(mut self, sink: ArcShared<dyn FailureSink>) -> Self {
    self.sink = sink;
    self
  }

  /// Returns the configured worker thread name.
  #[must_use]
  pub fn name(&self) -> &str {
    &self.name
  }

  /// Returns the configured failure sink.
  #[must_use]
  pub fn sink(&self) -> ArcShared<dyn FailureSink> {
    self.sink.clone()
  }
}

impl Default for InvokerConfig {
  fn default() -> Self {
    Self {
      name: String::from("takt-dispatch"),
      sink: ArcShared::from_arc(std::sync::Arc::new(TracingFailureSink) as std::sync::Arc<dyn FailureSink>),
    }
  }
}
