//! Dispatcher facade over the currently installed invoker.

mod base;
mod dispatcher_error;

pub use base::{Dispatcher, DispatcherRef};
pub use dispatcher_error::DispatcherError;
