use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::watchlist::{EntryUpdate, MovieId, WatchlistEntry};
use crate::error::{AppError, AppResult};

pub const PROFILE_EXISTS: &str = "User already exists";
pub const PROFILE_NOT_FOUND: &str = "User not found";
pub const EMAIL_TAKEN: &str = "Email already registered";
pub const ENTRY_EXISTS: &str = "Movie already in watchlist";
pub const ENTRY_NOT_FOUND: &str = "Movie not found in watchlist";

/// Notification opt-ins
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NotificationSettings {
    pub email: bool,
    pub push: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email: true,
            push: true,
        }
    }
}

/// Display preferences, carried through untouched by the store
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Preferences {
    pub favorite_genres: BTreeSet<String>,
    pub notifications: NotificationSettings,
}

/// A user's profile document with its embedded watchlist
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub watchlist_entries: Vec<WatchlistEntry>,
    #[serde(default)]
    pub preferences: Preferences,
}

impl UserProfile {
    /// Creates a profile with an empty watchlist
    pub fn new(request: NewProfile) -> Self {
        let now = Utc::now();
        Self {
            uid: request.uid,
            email: request.email,
            display_name: request.display_name,
            created_at: now,
            updated_at: now,
            watchlist_entries: Vec::new(),
            preferences: request.preferences.unwrap_or_default(),
        }
    }

    pub fn entry(&self, movie_id: MovieId) -> Option<&WatchlistEntry> {
        self.watchlist_entries
            .iter()
            .find(|entry| entry.movie_id == movie_id)
    }

    pub fn has_entry(&self, movie_id: MovieId) -> bool {
        self.entry(movie_id).is_some()
    }

    /// Appends an entry, rejecting a `movieId` that is already bookmarked
    pub fn add_entry(&mut self, entry: WatchlistEntry) -> AppResult<()> {
        if self.has_entry(entry.movie_id) {
            return Err(AppError::Conflict(ENTRY_EXISTS.to_string()));
        }
        self.watchlist_entries.push(entry);
        self.touch();
        Ok(())
    }

    /// Drops every entry with `movie_id`. Removing an absent movie is a no-op.
    pub fn remove_entry(&mut self, movie_id: MovieId) {
        self.watchlist_entries
            .retain(|entry| entry.movie_id != movie_id);
        self.touch();
    }

    /// Merges `update` onto the entry in place, keeping its position
    pub fn patch_entry(&mut self, movie_id: MovieId, update: &EntryUpdate) -> AppResult<()> {
        let entry = self
            .watchlist_entries
            .iter_mut()
            .find(|entry| entry.movie_id == movie_id)
            .ok_or_else(|| AppError::NotFound(ENTRY_NOT_FOUND.to_string()))?;

        update.apply_to(entry);
        self.touch();
        Ok(())
    }

    /// Shallow merge of the updatable top-level fields
    pub fn apply_update(&mut self, update: &ProfileUpdate) {
        if let Some(email) = &update.email {
            self.email = email.clone();
        }
        if let Some(display_name) = &update.display_name {
            self.display_name = display_name.clone();
        }
        if let Some(preferences) = &update.preferences {
            self.preferences = preferences.clone();
        }
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Request body for registering a profile
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProfile {
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub preferences: Option<Preferences>,
}

impl NewProfile {
    pub fn new(
        uid: impl Into<String>,
        email: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            display_name: display_name.into(),
            preferences: None,
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        require("uid", &self.uid)?;
        require("email", &self.email)?;
        require("displayName", &self.display_name)
    }
}

/// Partial update of a profile
///
/// Only the listed fields may change. Structural fields such as `uid`,
/// `createdAt` and `watchlistEntries` are rejected during deserialization.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub preferences: Option<Preferences>,
}

impl ProfileUpdate {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(email) = &self.email {
            require("email", email)?;
        }
        if let Some(display_name) = &self.display_name {
            require("displayName", display_name)?;
        }
        Ok(())
    }
}

fn require(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidInput(format!("{} is required", field)));
    }
    Ok(())
}
