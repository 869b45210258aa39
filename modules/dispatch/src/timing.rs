//! One-shot, repeating, and condition-gated actions over the scheduler.

mod deferred;
mod scratch;
mod time_out;
mod timer;

pub use deferred::{Deferred, DeferredRef};
pub use scratch::Scratch;
pub use time_out::TimeOut;
pub use timer::Timer;
