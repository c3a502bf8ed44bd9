use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use super::{profile_not_found, ProfileStore};
use crate::{
    error::{AppError, AppResult},
    models::{
        profile::{EMAIL_TAKEN, PROFILE_EXISTS},
        EntryUpdate, MovieId, ProfileUpdate, UserProfile, WatchlistEntry,
    },
};

type Slot = Arc<Mutex<UserProfile>>;

/// In-process profile store
///
/// Each profile sits behind its own mutex, so writers to one profile queue up
/// while other profiles stay available. Lock order is map, then profile, then
/// email index; the map lock is never held while waiting on a profile.
#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<HashMap<String, Slot>>,
    /// email -> uid
    emails: Mutex<HashMap<String, String>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, uid: &str) -> AppResult<Slot> {
        self.profiles
            .read()
            .await
            .get(uid)
            .cloned()
            .ok_or_else(profile_not_found)
    }

    /// Runs `mutate` on a copy of the profile and stores it only if it succeeds
    async fn modify<F>(&self, uid: &str, mutate: F) -> AppResult<UserProfile>
    where
        F: FnOnce(&mut UserProfile) -> AppResult<()> + Send,
    {
        let slot = self.slot(uid).await?;
        let mut current = slot.lock().await;

        let mut next = current.clone();
        mutate(&mut next)?;

        if next.email != current.email {
            let mut emails = self.emails.lock().await;
            if emails.contains_key(&next.email) {
                return Err(AppError::Conflict(EMAIL_TAKEN.to_string()));
            }
            emails.remove(&current.email);
            emails.insert(next.email.clone(), uid.to_string());
        }

        *current = next;
        Ok(current.clone())
    }
}

#[async_trait::async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn create_profile(&self, profile: UserProfile) -> AppResult<UserProfile> {
        let mut profiles = self.profiles.write().await;
        if profiles.contains_key(&profile.uid) {
            return Err(AppError::Conflict(PROFILE_EXISTS.to_string()));
        }

        let mut emails = self.emails.lock().await;
        if emails.contains_key(&profile.email) {
            return Err(AppError::Conflict(EMAIL_TAKEN.to_string()));
        }

        emails.insert(profile.email.clone(), profile.uid.clone());
        profiles.insert(profile.uid.clone(), Arc::new(Mutex::new(profile.clone())));
        Ok(profile)
    }

    async fn get_profile(&self, uid: &str) -> AppResult<UserProfile> {
        let slot = self.slot(uid).await?;
        let profile = slot.lock().await.clone();
        Ok(profile)
    }

    async fn update_profile(&self, uid: &str, update: ProfileUpdate) -> AppResult<UserProfile> {
        self.modify(uid, move |profile| {
            profile.apply_update(&update);
            Ok(())
        })
        .await
    }

    async fn add_entry(&self, uid: &str, entry: WatchlistEntry) -> AppResult<UserProfile> {
        self.modify(uid, move |profile| profile.add_entry(entry)).await
    }

    async fn remove_entry(&self, uid: &str, movie_id: MovieId) -> AppResult<UserProfile> {
        self.modify(uid, move |profile| {
            profile.remove_entry(movie_id);
            Ok(())
        })
        .await
    }

    async fn patch_entry(
        &self,
        uid: &str,
        movie_id: MovieId,
        update: EntryUpdate,
    ) -> AppResult<UserProfile> {
        self.modify(uid, move |profile| profile.patch_entry(movie_id, &update))
            .await
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn close(&self) {
        let profiles = self.profiles.read().await.len();
        tracing::debug!(profiles, "Dropping in-memory profile store");
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
