//! Millisecond clock abstractions.
//!
//! The scheduler and timers do all arithmetic in epoch milliseconds; routing
//! it through [`Clock`] keeps that arithmetic testable with [`ManualClock`].

mod clock;
mod manual_clock;
mod system_clock;

pub use clock::Clock;
pub use manual_clock::ManualClock;
pub use system_clock::SystemClock;
