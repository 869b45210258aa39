/// Result of asking a combiner to fold an incoming event into a queued one.
#[derive(Debug)]
pub enum MergeOutcome<P> {
  /// The queued parameters already cover the incoming event; absorb it as-is.
  Keep,
  /// Absorb the incoming event, replacing the queued parameters.
  Replace(P),
  /// Do not merge with this candidate; try the next one.
  Skip,
}
