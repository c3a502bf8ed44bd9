use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AppError, AppResult};

/// Catalog identifier of a movie, as issued by the external metadata API
pub type MovieId = i64;

/// A movie bookmarked in a user's watchlist
///
/// Descriptive fields are a snapshot of the catalog data at insertion time and
/// are never re-synced. Only `watched` changes after insertion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistEntry {
    pub movie_id: MovieId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub year: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub rating: Option<String>,
    pub added_at: DateTime<Utc>,
    #[serde(default)]
    pub watched: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

/// Catalog clients send `year` and `rating` as either JSON strings or numbers.
/// Both are kept in their string form.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<StringOrNumber>::deserialize(deserializer)?;
    Ok(value.map(|value| match value {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    }))
}

/// Request body for adding a movie to a watchlist
///
/// Catalog payloads name the identifier `id`, so that alias is accepted too.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntry {
    #[serde(alias = "id")]
    pub movie_id: MovieId,
    pub title: String,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default)]
    pub backdrop: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub year: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub rating: Option<String>,
    #[serde(default)]
    pub added_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub watched: Option<bool>,
}

impl NewEntry {
    /// Creates a minimal entry request with only the required fields
    pub fn new(movie_id: MovieId, title: impl Into<String>) -> Self {
        Self {
            movie_id,
            title: title.into(),
            poster: None,
            backdrop: None,
            overview: None,
            genre: None,
            year: None,
            rating: None,
            added_at: None,
            watched: None,
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::InvalidInput("title is required".to_string()));
        }
        Ok(())
    }

    /// Materializes the entry, stamping `addedAt` with `now` if the caller left it unset
    pub fn into_entry(self, now: DateTime<Utc>) -> WatchlistEntry {
        WatchlistEntry {
            movie_id: self.movie_id,
            title: self.title,
            poster: self.poster,
            backdrop: self.backdrop,
            overview: self.overview,
            genre: self.genre,
            year: self.year,
            rating: self.rating,
            added_at: self.added_at.unwrap_or(now),
            watched: self.watched.unwrap_or(false),
        }
    }
}

/// Partial update of a watchlist entry. `watched` is the only mutable field.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EntryUpdate {
    #[serde(default)]
    pub watched: Option<bool>,
}

impl EntryUpdate {
    pub fn apply_to(&self, entry: &mut WatchlistEntry) {
        if let Some(watched) = self.watched {
            entry.watched = watched;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_entry_accepts_catalog_id_alias() {
        let entry: NewEntry = serde_json::from_value(json!({
            "id": 438631,
            "title": "Dune",
            "year": "2021"
        }))
        .unwrap();

        assert_eq!(entry.movie_id, 438631);
        assert_eq!(entry.year.as_deref(), Some("2021"));
    }

    #[test]
    fn test_numeric_year_and_rating_become_strings() {
        let entry: NewEntry = serde_json::from_value(json!({
            "id": 438631,
            "title": "Dune",
            "year": 2021,
            "rating": 7.8,
            "backdrop": null
        }))
        .unwrap();

        assert_eq!(entry.year.as_deref(), Some("2021"));
        assert_eq!(entry.rating.as_deref(), Some("7.8"));
        assert_eq!(entry.backdrop, None);
    }

    #[test]
    fn test_non_scalar_year_is_rejected() {
        let result = serde_json::from_value::<NewEntry>(json!({
            "id": 1,
            "title": "Alien",
            "year": [1979]
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_into_entry_defaults() {
        let now = Utc::now();
        let entry = NewEntry::new(42, "Dune").into_entry(now);

        assert_eq!(entry.added_at, now);
        assert!(!entry.watched);
    }

    #[test]
    fn test_into_entry_keeps_supplied_timestamp() {
        let added_at = DateTime::parse_from_rfc3339("2024-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut request = NewEntry::new(42, "Dune");
        request.added_at = Some(added_at);

        let entry = request.into_entry(Utc::now());
        assert_eq!(entry.added_at, added_at);
    }

    #[test]
    fn test_blank_title_is_invalid() {
        let request = NewEntry::new(42, "   ");
        assert!(matches!(request.validate(), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_entry_update_rejects_other_fields() {
        let result = serde_json::from_value::<EntryUpdate>(json!({
            "watched": true,
            "title": "Renamed"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_entry_serializes_camel_case() {
        let entry = NewEntry::new(42, "Dune").into_entry(Utc::now());
        let value = serde_json::to_value(&entry).unwrap();

        assert_eq!(value["movieId"], 42);
        assert_eq!(value["watched"], false);
        assert!(value.get("addedAt").is_some());
        assert!(value.get("poster").is_none());
    }
}
