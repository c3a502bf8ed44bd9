use std::sync::Arc;

use crate::db::{MemoryProfileStore, ProfileStore};
use crate::services::WatchlistService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub watchlist: WatchlistService,
}

impl AppState {
    /// Creates application state around an already opened store
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self {
            watchlist: WatchlistService::new(store),
        }
    }

    /// State backed by a fresh in-memory store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryProfileStore::new()))
    }
}
