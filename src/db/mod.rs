//! Persistence for profile documents
//!
//! Each profile, watchlist included, is stored as a single document. Every
//! mutating operation is one atomic read-modify-write of that document, and
//! implementations must serialize those per `uid` so that concurrent writers
//! cannot break the uniqueness of `movieId` within a watchlist.

use crate::{
    error::{AppError, AppResult},
    models::{
        profile::PROFILE_NOT_FOUND, EntryUpdate, MovieId, ProfileUpdate, UserProfile,
        WatchlistEntry,
    },
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryProfileStore;
pub use postgres::{create_pool, PgProfileStore};

/// Storage backend for profile documents
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ProfileStore: Send + Sync {
    /// Persists a new profile. Fails with `Conflict` if the uid or email is taken.
    async fn create_profile(&self, profile: UserProfile) -> AppResult<UserProfile>;

    async fn get_profile(&self, uid: &str) -> AppResult<UserProfile>;

    /// Applies a shallow merge of the allowed profile fields
    async fn update_profile(&self, uid: &str, update: ProfileUpdate) -> AppResult<UserProfile>;

    /// Appends an entry unless its `movieId` is already in the watchlist
    async fn add_entry(&self, uid: &str, entry: WatchlistEntry) -> AppResult<UserProfile>;

    async fn remove_entry(&self, uid: &str, movie_id: MovieId) -> AppResult<UserProfile>;

    async fn patch_entry(
        &self,
        uid: &str,
        movie_id: MovieId,
        update: EntryUpdate,
    ) -> AppResult<UserProfile>;

    /// Checks that the backend is reachable
    async fn ping(&self) -> AppResult<()>;

    /// Releases backend resources. Called once at shutdown.
    async fn close(&self);

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

pub(crate) fn profile_not_found() -> AppError {
    AppError::NotFound(PROFILE_NOT_FOUND.to_string())
}
