//! Time-ordered scheduling of delayed work.

mod base;
mod scheduled_item;
mod scheduler_runnable;

pub use base::{Scheduler, SchedulerRef};
pub use scheduled_item::{ScheduleHandle, ScheduledItem};
pub use scheduler_runnable::SchedulerRunnable;
