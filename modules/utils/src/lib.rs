#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::print_stdout, clippy::dbg_macro)]
#![deny(clippy::missing_errors_doc, clippy::missing_panics_doc)]
#![deny(unreachable_pub)]

//! Shared-ownership, synchronization, and clock helpers for the takt runtime.

/// Blocking coordination primitives.
pub mod concurrent;

/// Shared-ownership wrappers.
pub mod sync;

/// Millisecond clock abstractions.
pub mod time;
