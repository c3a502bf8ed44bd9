use chrono::Utc;
use std::sync::Arc;

use crate::{
    db::ProfileStore,
    error::AppResult,
    models::{
        EntryUpdate, MovieId, NewEntry, NewProfile, ProfileUpdate, UserProfile, WatchlistEntry,
    },
};

/// Profile and watchlist operations over an injected store
///
/// Input is validated here before the store is touched; the store owns
/// atomicity and the uniqueness checks.
#[derive(Clone)]
pub struct WatchlistService {
    store: Arc<dyn ProfileStore>,
}

impl WatchlistService {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    pub async fn create_profile(&self, request: NewProfile) -> AppResult<UserProfile> {
        request.validate()?;
        let profile = self.store.create_profile(UserProfile::new(request)).await?;

        tracing::info!(uid = %profile.uid, "Profile created");
        Ok(profile)
    }

    pub async fn get_profile(&self, uid: &str) -> AppResult<UserProfile> {
        self.store.get_profile(uid).await
    }

    pub async fn update_profile(&self, uid: &str, update: ProfileUpdate) -> AppResult<UserProfile> {
        update.validate()?;
        self.store.update_profile(uid, update).await
    }

    pub async fn add_entry(&self, uid: &str, request: NewEntry) -> AppResult<UserProfile> {
        request.validate()?;
        let movie_id = request.movie_id;
        let profile = self
            .store
            .add_entry(uid, request.into_entry(Utc::now()))
            .await?;

        tracing::info!(
            uid = %uid,
            movie_id,
            watchlist_len = profile.watchlist_entries.len(),
            "Movie added to watchlist"
        );
        Ok(profile)
    }

    pub async fn remove_entry(&self, uid: &str, movie_id: MovieId) -> AppResult<UserProfile> {
        let profile = self.store.remove_entry(uid, movie_id).await?;

        tracing::info!(
            uid = %uid,
            movie_id,
            watchlist_len = profile.watchlist_entries.len(),
            "Movie removed from watchlist"
        );
        Ok(profile)
    }

    pub async fn list_entries(&self, uid: &str) -> AppResult<Vec<WatchlistEntry>> {
        let profile = self.store.get_profile(uid).await?;
        Ok(profile.watchlist_entries)
    }

    pub async fn has_entry(&self, uid: &str, movie_id: MovieId) -> AppResult<bool> {
        let profile = self.store.get_profile(uid).await?;
        Ok(profile.has_entry(movie_id))
    }

    pub async fn patch_entry(
        &self,
        uid: &str,
        movie_id: MovieId,
        update: EntryUpdate,
    ) -> AppResult<UserProfile> {
        self.store.patch_entry(uid, movie_id, update).await
    }

    /// Whether the backing store answers
    pub async fn store_connected(&self) -> bool {
        match self.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, store = self.store.name(), "Store ping failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryProfileStore, MockProfileStore};
    use crate::error::AppError;

    fn memory_service() -> WatchlistService {
        WatchlistService::new(Arc::new(MemoryProfileStore::new()))
    }

    #[tokio::test]
    async fn test_invalid_profile_never_reaches_store() {
        // No expectations: any store call would panic
        let service = WatchlistService::new(Arc::new(MockProfileStore::new()));

        let result = service
            .create_profile(NewProfile::new("u1", "", "A"))
            .await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));

        let result = service.add_entry("u1", NewEntry::new(42, "")).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_add_entry_stamps_added_at() {
        let mut store = MockProfileStore::new();
        store
            .expect_add_entry()
            .withf(|uid, entry| uid == "u1" && entry.movie_id == 42 && !entry.watched)
            .times(1)
            .returning(|uid, entry| {
                let mut profile = UserProfile::new(NewProfile::new(uid, "a@x.com", "A"));
                profile.watchlist_entries.push(entry);
                Ok(profile)
            });

        let service = WatchlistService::new(Arc::new(store));
        let before = Utc::now();
        let profile = service
            .add_entry("u1", NewEntry::new(42, "Dune"))
            .await
            .unwrap();

        assert!(profile.watchlist_entries[0].added_at >= before);
    }

    #[tokio::test]
    async fn test_store_failures_propagate() {
        let mut store = MockProfileStore::new();
        store
            .expect_get_profile()
            .returning(|_| Err(AppError::Internal("connection reset".to_string())));

        let service = WatchlistService::new(Arc::new(store));
        let result = service.list_entries("u1").await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn test_failed_ping_reports_disconnected() {
        let mut store = MockProfileStore::new();
        store
            .expect_ping()
            .returning(|| Err(AppError::Internal("pool closed".to_string())));
        store.expect_name().return_const("mock");

        let service = WatchlistService::new(Arc::new(store));
        assert!(!service.store_connected().await);
    }

    #[tokio::test]
    async fn test_watchlist_lifecycle() {
        let service = memory_service();
        let created = service
            .create_profile(NewProfile::new("u1", "a@x.com", "A"))
            .await
            .unwrap();
        assert!(created.watchlist_entries.is_empty());

        service
            .add_entry("u1", NewEntry::new(42, "Dune"))
            .await
            .unwrap();
        assert!(service.has_entry("u1", 42).await.unwrap());

        service
            .patch_entry(
                "u1",
                42,
                EntryUpdate {
                    watched: Some(true),
                },
            )
            .await
            .unwrap();
        let entries = service.list_entries("u1").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].watched);

        service.remove_entry("u1", 42).await.unwrap();
        assert!(service.list_entries("u1").await.unwrap().is_empty());
        assert!(!service.has_entry("u1", 42).await.unwrap());
    }

    #[tokio::test]
    async fn test_blank_display_name_update_is_rejected() {
        let service = memory_service();
        service
            .create_profile(NewProfile::new("u1", "a@x.com", "A"))
            .await
            .unwrap();

        let result = service
            .update_profile(
                "u1",
                ProfileUpdate {
                    display_name: Some("  ".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
        assert_eq!(service.get_profile("u1").await.unwrap().display_name, "A");
    }
}
