//! Cross-thread result futures.

mod dispatch_future;
mod future_error;

pub use dispatch_future::{DispatchFuture, FutureRef};
pub use future_error::FutureError;
