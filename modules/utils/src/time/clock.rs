/// Source of the current time in epoch milliseconds.
pub trait Clock: Send + Sync + 'static {
  /// Returns the current time as milliseconds since the Unix epoch.
  fn now_millis(&self) -> u64;
}
