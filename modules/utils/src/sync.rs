//! Shared-ownership wrappers over `std::sync`.

mod arc_shared;
mod weak_shared;

pub use arc_shared::ArcShared;
pub use weak_shared::WeakShared;
