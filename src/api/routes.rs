use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;
use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .fallback(handlers::route_not_found)
        // Outermost first: the id must exist before the trace span is made
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
        .with_state(state)
}

/// API routes under /api
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Profiles
        .route("/users", post(handlers::create_profile))
        .route(
            "/users/:uid",
            get(handlers::get_profile).put(handlers::update_profile),
        )
        // Watchlist
        .route(
            "/users/:uid/watchlist",
            get(handlers::list_entries).post(handlers::add_entry),
        )
        .route(
            "/users/:uid/watchlist/:movie_id",
            get(handlers::has_entry)
                .patch(handlers::patch_entry)
                .delete(handlers::remove_entry),
        )
        // Applies to the routes above; a known path with an unknown method is a 404
        .method_not_allowed_fallback(handlers::route_not_found)
}
