use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::models::{
    EntryUpdate, MovieId, NewEntry, NewProfile, ProfileUpdate, UserProfile, WatchlistEntry,
};

use super::AppState;

// Request/Response types

type BodyResult<T> = Result<Json<T>, JsonRejection>;
type EntryPath = Result<Path<(String, MovieId)>, PathRejection>;

/// Lookup and removal accept any segment; one that is not an integer names no entry
#[derive(Debug, Deserialize)]
pub struct LookupPath {
    uid: String,
    movie_id: String,
}

impl LookupPath {
    fn movie_id(&self) -> Option<MovieId> {
        self.movie_id.trim().parse().ok()
    }
}

#[derive(Debug, Serialize)]
pub struct ExistsResponse {
    pub exists: bool,
}

// Handlers

/// Health check endpoint, also reports whether the store answers
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let store_connected = state.watchlist.store_connected().await;
    Json(json!({
        "status": "healthy",
        "storeConnected": store_connected
    }))
}

/// Register a profile for an identity the caller has already authenticated
pub async fn create_profile(
    State(state): State<AppState>,
    payload: BodyResult<NewProfile>,
) -> AppResult<(StatusCode, Json<UserProfile>)> {
    let Json(request) = payload?;
    let profile = state.watchlist.create_profile(request).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> AppResult<Json<UserProfile>> {
    Ok(Json(state.watchlist.get_profile(&uid).await?))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    payload: BodyResult<ProfileUpdate>,
) -> AppResult<Json<UserProfile>> {
    let Json(update) = payload?;
    Ok(Json(state.watchlist.update_profile(&uid, update).await?))
}

/// Add a movie to the watchlist
pub async fn add_entry(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    payload: BodyResult<NewEntry>,
) -> AppResult<Json<UserProfile>> {
    let Json(request) = payload?;
    Ok(Json(state.watchlist.add_entry(&uid, request).await?))
}

/// Get the watchlist in insertion order
pub async fn list_entries(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> AppResult<Json<Vec<WatchlistEntry>>> {
    Ok(Json(state.watchlist.list_entries(&uid).await?))
}

/// Check whether a movie is in the watchlist
pub async fn has_entry(
    State(state): State<AppState>,
    path: Result<Path<LookupPath>, PathRejection>,
) -> AppResult<Json<ExistsResponse>> {
    let Path(path) = path?;
    let exists = match path.movie_id() {
        Some(movie_id) => state.watchlist.has_entry(&path.uid, movie_id).await?,
        None => {
            // Still 404s for an unknown user
            state.watchlist.get_profile(&path.uid).await?;
            false
        }
    };
    Ok(Json(ExistsResponse { exists }))
}

/// Remove a movie from the watchlist; removing an absent movie succeeds
pub async fn remove_entry(
    State(state): State<AppState>,
    path: Result<Path<LookupPath>, PathRejection>,
) -> AppResult<Json<UserProfile>> {
    let Path(path) = path?;
    let profile = match path.movie_id() {
        Some(movie_id) => state.watchlist.remove_entry(&path.uid, movie_id).await?,
        None => state.watchlist.get_profile(&path.uid).await?,
    };
    Ok(Json(profile))
}

/// Update a movie in the watchlist (e.g. mark as watched)
pub async fn patch_entry(
    State(state): State<AppState>,
    path: EntryPath,
    payload: BodyResult<EntryUpdate>,
) -> AppResult<Json<UserProfile>> {
    let Path((uid, movie_id)) = path?;
    let Json(update) = payload?;
    Ok(Json(
        state.watchlist.patch_entry(&uid, movie_id, update).await?,
    ))
}

pub async fn route_not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}
