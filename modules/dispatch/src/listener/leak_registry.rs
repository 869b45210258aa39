use core::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};

use ahash::RandomState;
use hashbrown::HashMap;

use crate::support;

static NEXT_ID: AtomicUsize = AtomicUsize::new(1);
static LIVE: OnceLock<Mutex<HashMap<usize, &'static str, RandomState>>> = OnceLock::new();

fn live() -> &'static Mutex<HashMap<usize, &'static str, RandomState>> {
  LIVE.get_or_init(|| Mutex::new(HashMap::with_hasher(RandomState::new())))
}

/// Debug-build membership in the process-wide registry of live groups.
///
/// Created when a group is built, dropped with it. Release builds compile
/// the whole module out.
pub(crate) struct LeakToken {
  id: usize,
}

impl LeakToken {
  pub(crate) fn register(listener_type: &'static str) -> Self {
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    support::lock(live()).insert(id, listener_type);
    Self { id }
  }
}

impl Drop for LeakToken {
  fn drop(&mut self) {
    support::lock(live()).remove(&self.id);
  }
}

/// Number of listener groups currently alive in the process.
#[must_use]
pub fn live_group_count() -> usize {
  support::lock(live()).len()
}

/// Listener type names of the groups currently alive, for leak diagnostics.
#[must_use]
pub fn live_group_names() -> Vec<&'static str> {
  support::lock(live()).values().copied().collect()
}
