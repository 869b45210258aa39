use core::fmt;

/// Errors raised by [`Dispatcher`](super::Dispatcher) operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatcherError {
  /// No invoker is installed; `init` was never called or `dispose` ran.
  NotInitialized,
}

impl fmt::Display for DispatcherError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      | DispatcherError::NotInitialized => f.write_str("dispatcher is not initialized"),
    }
  }
}
