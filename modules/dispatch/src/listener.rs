//! Broadcast listener groups with optional event coalescing.
//!
//! A group fans one event-method invocation out to every registered listener,
//! on the dispatch thread. With a merge strategy and a delivery delay,
//! bursts of compatible events collapse into fewer deliveries.

mod alias_key;
mod event_method;
mod group_builder;
#[cfg(debug_assertions)]
mod leak_registry;
mod listener_group;
mod listener_handle;
mod listener_registration;
mod merge_index;
mod merge_key;
mod merge_outcome;
mod merge_strategy;
mod queued_event_item;

pub use alias_key::{AliasKey, AliasValue};
pub use event_method::EventMethod;
pub use group_builder::ListenerGroupBuilder;
#[cfg(debug_assertions)]
pub use leak_registry::{live_group_count, live_group_names};
pub use listener_group::ListenerGroup;
pub use listener_handle::ListenerHandle;
pub use merge_key::MergeKey;
pub use merge_outcome::MergeOutcome;
pub use merge_strategy::{MergeActionBuilder, MergeCombinerBuilder, MergeStrategy, MergeStrategyBuilder};
pub use queued_event_item::QueuedEventItem;

pub(crate) use merge_index::MergeIndex;
