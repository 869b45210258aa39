/// Action stored behind a schedule entry.
///
/// The common invoke shape for everything the scheduler fires; closures get a
/// blanket implementation so call sites can pass them directly.
pub trait SchedulerRunnable: Send + Sync + 'static {
  /// Executes the action on the dispatch thread.
  fn run(&self);
}

impl<F> SchedulerRunnable for F
where
  F: Fn() + Send + Sync + 'static,
{
  fn run(&self) {
    (self)();
  }
}
