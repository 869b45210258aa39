/// Group key derived from event parameters by a merge action's selector.
///
/// Two pending events for the same listener are merge candidates only when
/// their selectors produce equal keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MergeKey {
  /// All events of the method share one group.
  Unit,
  /// Integer-derived group.
  Int(i64),
  /// Text-derived group.
  Text(String),
}

impl From<i64> for MergeKey {
  fn from(value: i64) -> Self {
    MergeKey::Int(value)
  }
}

impl From<String> for MergeKey {
  fn from(value: String) -> Self {
    MergeKey::Text(value)
  }
}

impl From<&str> for MergeKey {
  fn from(value: &str) -> Self {
    MergeKey::Text(String::from(value))
  }
}

impl From<()> for MergeKey {
  fn from((): ()) -> Self {
    MergeKey::Unit
  }
}
