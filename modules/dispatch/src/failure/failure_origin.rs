use core::fmt;

/// Identifies how the failed task reached the dispatch thread.
///
/// Scheduled and broadcast work is handed to the invoker as plain dispatch
/// tasks, so their panics surface as [`DispatchTask`](Self::DispatchTask).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureOrigin {
  /// A task submitted through `dispatch`.
  DispatchTask,
  /// A task submitted through a blocking `call`.
  BlockingCall,
}

impl fmt::Display for FailureOrigin {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      | FailureOrigin::DispatchTask => f.write_str("dispatch task"),
      | FailureOrigin::BlockingCall => f.write_str("blocking call"),
    }
  }
}
