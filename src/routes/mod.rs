use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    middleware::{make_span_with_request_id, request_id_middleware},
    state::AppState,
};

pub mod collections;
mod extract;
pub mod genres;
pub mod movies;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(
            // Request id first, so the trace span already sees it
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Catalog
        .route("/genres", get(genres::list_genres))
        .route("/genres/:id/movies", get(genres::movies_by_genre))
        .route("/movies/top-rated", get(movies::top_rated))
        .route("/movies/popular", get(movies::popular))
        .route("/movies/:id", get(movies::details))
        .route("/movies/:id/credits", get(movies::credits))
        .route("/movies/:id/similar", get(movies::similar))
        .route("/search", get(movies::search))
        // Local collections
        .route(
            "/recently-viewed",
            get(collections::recently_viewed).delete(collections::clear_recently_viewed),
        )
        .route(
            "/watch-later",
            get(collections::watch_later)
                .post(collections::add_to_watch_later)
                .delete(collections::clear_watch_later),
        )
        .route(
            "/watch-later/:id",
            get(collections::watch_later_status).delete(collections::remove_from_watch_later),
        )
        .route("/watch-later/:id/toggle", post(collections::toggle_watch_later))
}

/// `?page=` on list endpoints, 1 when absent
#[derive(Debug, Deserialize)]
pub struct PageParams {
    #[serde(default = "first_page")]
    pub page: u32,
}

fn first_page() -> u32 {
    1
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
