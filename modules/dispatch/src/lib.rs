#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::print_stdout, clippy::dbg_macro)]
#![deny(clippy::missing_errors_doc, clippy::missing_panics_doc)]
#![deny(unreachable_pub)]

//! In-process dispatch/event runtime.
//!
//! The crate coordinates work between one logical dispatch thread and the
//! rest of the process: a pluggable single-consumer [`invoker::AsyncInvoker`],
//! the [`dispatcher::Dispatcher`] facade routing everything to the currently
//! installed invoker, a time-ordered [`scheduler::Scheduler`] thread,
//! broadcast [`listener::ListenerGroup`]s with optional event coalescing, a
//! cross-thread [`future::DispatchFuture`], and condition-gated
//! [`timing::Deferred`] actions.

/// Dispatcher facade over the currently installed invoker.
pub mod dispatcher;

/// Failure payloads and sinks for asynchronous work.
pub mod failure;

/// Cross-thread result futures.
pub mod future;

/// Invoker contract and the FIFO worker-thread implementation.
pub mod invoker;

/// Broadcast listener groups with optional event coalescing.
pub mod listener;

/// Time-ordered scheduling of delayed work.
pub mod scheduler;

pub(crate) mod support;

/// One-shot, repeating, and condition-gated actions.
pub mod timing;
