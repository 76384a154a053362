use axum::{
    extract::State,
    Json,
};
use serde::{Deserialize, Serialize};

use super::extract::{Path, Query};
use crate::{
    error::{AppError, AppResult},
    models::{Genre, GenreCatalog, Movie, Paginated, SortKey},
    services::QueryResult,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct GenreMoviesParams {
    #[serde(default = "super::first_page")]
    page: u32,
    sort_by: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenreMoviesResponse {
    pub genre: Option<Genre>,
    pub sort_by: SortKey,
    pub sort_options: [SortKey; 8],
    #[serde(flatten)]
    pub result: QueryResult<Paginated<Movie>>,
}

/// Handler for the genre catalog
pub async fn list_genres(State(state): State<AppState>) -> AppResult<Json<QueryResult<GenreCatalog>>> {
    Ok(Json(state.queries.genres().await?))
}

/// Handler for one genre's movie listing
///
/// A genre id the catalog doesn't know is a not-found, not an empty list.
pub async fn movies_by_genre(
    State(state): State<AppState>,
    Path(genre_id): Path<u32>,
    Query(params): Query<GenreMoviesParams>,
) -> AppResult<Json<GenreMoviesResponse>> {
    let sort_by = match params.sort_by.as_deref() {
        Some(raw) if !raw.is_empty() => raw
            .parse::<SortKey>()
            .map_err(|e| AppError::InvalidInput(e.to_string()))?,
        _ => SortKey::default(),
    };

    let genre = if genre_id == 0 {
        None
    } else {
        let catalog = state.queries.genres().await?.data.unwrap_or_default();
        let name = catalog
            .name_of(genre_id)
            .ok_or_else(|| AppError::NotFound(format!("Genre {} not found", genre_id)))?;
        Some(Genre {
            id: genre_id,
            name: name.to_string(),
        })
    };

    let result = state
        .queries
        .movies_by_genre(genre_id, params.page, sort_by)
        .await
        .map_err(|e| AppError::not_found_or_remote(e, format!("Genre {} not found", genre_id)))?;

    Ok(Json(GenreMoviesResponse {
        genre,
        sort_by,
        sort_options: SortKey::all(),
        result,
    }))
}
