use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use super::extract::{JsonBody, Path};
use crate::{
    error::{AppError, AppResult},
    models::{MovieSummary, RecentlyViewedEntry, WatchLaterEntry},
    state::AppState,
};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MembershipResponse {
    pub id: u64,
    pub in_watch_later: bool,
}

impl MembershipResponse {
    fn new(id: u64, in_watch_later: bool) -> Self {
        Self { id, in_watch_later }
    }
}

pub async fn recently_viewed(State(state): State<AppState>) -> Json<Vec<RecentlyViewedEntry>> {
    Json(state.recently_viewed.movies())
}

pub async fn clear_recently_viewed(State(state): State<AppState>) -> StatusCode {
    state.recently_viewed.clear_all();
    StatusCode::NO_CONTENT
}

pub async fn watch_later(State(state): State<AppState>) -> Json<Vec<WatchLaterEntry>> {
    Json(state.watch_later.movies())
}

/// Handler for bookmarking a movie
///
/// Accepts any stored summary shape. Returns 201 when the movie was added
/// and 200 when it was already bookmarked.
pub async fn add_to_watch_later(
    State(state): State<AppState>,
    JsonBody(movie): JsonBody<MovieSummary>,
) -> AppResult<(StatusCode, Json<MembershipResponse>)> {
    if movie.id == 0 {
        return Err(AppError::InvalidInput("Movie id must be positive".to_string()));
    }

    let id = movie.id;
    let status = if state.watch_later.add_movie(movie) {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(MembershipResponse::new(id, true))))
}

pub async fn clear_watch_later(State(state): State<AppState>) -> StatusCode {
    state.watch_later.clear_all();
    StatusCode::NO_CONTENT
}

pub async fn watch_later_status(
    State(state): State<AppState>,
    Path(movie_id): Path<u64>,
) -> Json<MembershipResponse> {
    let in_watch_later = state.watch_later.is_in_watch_later(movie_id);
    Json(MembershipResponse::new(movie_id, in_watch_later))
}

pub async fn remove_from_watch_later(
    State(state): State<AppState>,
    Path(movie_id): Path<u64>,
) -> Json<MembershipResponse> {
    state.watch_later.remove_movie(movie_id);
    Json(MembershipResponse::new(movie_id, false))
}

/// Handler for the bookmark toggle on the detail view
///
/// The summary is built from the movie details, loaded through the cache.
pub async fn toggle_watch_later(
    State(state): State<AppState>,
    Path(movie_id): Path<u64>,
) -> AppResult<Json<MembershipResponse>> {
    let details = state
        .queries
        .movie_details(movie_id)
        .await
        .map_err(|e| AppError::not_found_or_remote(e, format!("Movie {} not found", movie_id)))?
        .data
        .ok_or_else(|| AppError::InvalidInput("Movie id must be positive".to_string()))?;

    let in_watch_later = state.watch_later.toggle(MovieSummary::from(&details));
    Ok(Json(MembershipResponse::new(movie_id, in_watch_later)))
}
