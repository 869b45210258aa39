//! Failure payloads and sinks for asynchronous work.
//!
//! Every panic raised inside dispatched, scheduled, or broadcast work is
//! caught by the owning run loop and funnelled through a [`FailureSink`], so
//! asynchronous failures always have exactly one observable channel.

mod dispatch_failure;
mod failure_origin;
mod failure_payload;
mod failure_sink;
mod tracing_failure_sink;

pub use dispatch_failure::DispatchFailure;
pub use failure_origin::FailureOrigin;
pub use failure_payload::FailurePayload;
pub use failure_sink::FailureSink;
pub use tracing_failure_sink::TracingFailureSink;
