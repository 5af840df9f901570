//! Memoized handle on the currently active hackathon.
//!
//! The handle moves through three states: unresolved (empty cell),
//! resolving (one fetch in flight, other callers wait on it) and resolved
//! (value replayed to every caller). [`ActiveHackathonCell::invalidate`]
//! swaps in a fresh cell, so callers already waiting on the old cell may
//! still see the old value but every later read re-resolves.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OnceCell;

use crate::error::DbError;
use crate::models::hackathon::Hackathon;

#[derive(Debug, Default)]
pub struct ActiveHackathonCell {
    current: Mutex<Arc<OnceCell<Hackathon>>>,
}

impl ActiveHackathonCell {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> Arc<OnceCell<Hackathon>> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Return the cached hackathon, running `fetch` if nothing is cached.
    /// Concurrent callers share a single `fetch`. A failed fetch leaves
    /// the cell unresolved.
    pub async fn get_or_resolve<F, Fut>(&self, fetch: F) -> Result<Hackathon, DbError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Hackathon, DbError>>,
    {
        let slot = self.slot();
        slot.get_or_try_init(fetch).await.cloned()
    }

    pub fn invalidate(&self) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Arc::new(OnceCell::new());
    }

    pub fn is_resolved(&self) -> bool {
        self.slot().initialized()
    }
}
