use axum::{
    extract::State,
    Json,
};
use serde::{Deserialize, Serialize};

use super::{
    extract::{Path, Query},
    PageParams,
};
use crate::{
    error::{AppError, AppResult},
    models::{CastMember, Credits, CrewMember, Movie, MovieDetails, MovieSummary, Paginated},
    services::{
        format::{format_runtime, year_from_date},
        BackdropSize, ImageUrls, PosterSize, ProfileSize, QueryResult,
    },
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    query: String,
    #[serde(default = "super::first_page")]
    page: u32,
}

/// Movie details as shown on the detail view
#[derive(Debug, Serialize)]
pub struct MovieDetailsView {
    #[serde(flatten)]
    pub details: MovieDetails,
    pub poster_url: String,
    pub backdrop_url: String,
    pub release_year: Option<i32>,
    pub runtime_label: Option<String>,
    pub in_watch_later: bool,
}

impl MovieDetailsView {
    fn new(details: MovieDetails, images: &ImageUrls, in_watch_later: bool) -> Self {
        let year = year_from_date(&details.release_date);
        Self {
            poster_url: images.poster(details.poster_path.as_deref(), PosterSize::default()),
            backdrop_url: images.backdrop(details.backdrop_path.as_deref(), BackdropSize::default()),
            release_year: (year > 0).then_some(year),
            runtime_label: details.runtime.filter(|m| *m > 0).map(format_runtime),
            in_watch_later,
            details,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CastView {
    #[serde(flatten)]
    pub member: CastMember,
    pub profile_url: String,
}

#[derive(Debug, Serialize)]
pub struct CreditsView {
    pub id: u64,
    pub cast: Vec<CastView>,
    pub crew: Vec<CrewMember>,
}

impl CreditsView {
    fn new(credits: Credits, images: &ImageUrls) -> Self {
        let cast = credits
            .cast
            .into_iter()
            .map(|member| CastView {
                profile_url: images.profile(member.profile_path.as_deref(), ProfileSize::default()),
                member,
            })
            .collect();

        Self {
            id: credits.id,
            cast,
            crew: credits.crew,
        }
    }
}

fn movie_not_found(movie_id: u64) -> impl FnOnce(crate::error::RemoteFetchError) -> AppError {
    move |e| AppError::not_found_or_remote(e, format!("Movie {} not found", movie_id))
}

pub async fn top_rated(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<QueryResult<Paginated<Movie>>>> {
    Ok(Json(state.queries.top_rated(params.page).await?))
}

pub async fn popular(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<QueryResult<Paginated<Movie>>>> {
    Ok(Json(state.queries.popular(params.page).await?))
}

/// Handler for title search; a blank query comes back disabled
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<QueryResult<Paginated<Movie>>>> {
    Ok(Json(state.queries.search(&params.query, params.page).await?))
}

/// Handler for the movie detail view
///
/// Every successful load is recorded in the viewing history.
pub async fn details(
    State(state): State<AppState>,
    Path(movie_id): Path<u64>,
) -> AppResult<Json<QueryResult<MovieDetailsView>>> {
    let result = state
        .queries
        .movie_details(movie_id)
        .await
        .map_err(movie_not_found(movie_id))?;

    if let Some(details) = &result.data {
        state.recently_viewed.add_movie(MovieSummary::from(details));
    }

    let in_watch_later = state.watch_later.is_in_watch_later(movie_id);
    Ok(Json(result.map(|details| {
        MovieDetailsView::new(details, &state.images, in_watch_later)
    })))
}

pub async fn credits(
    State(state): State<AppState>,
    Path(movie_id): Path<u64>,
) -> AppResult<Json<QueryResult<CreditsView>>> {
    let result = state
        .queries
        .movie_credits(movie_id)
        .await
        .map_err(movie_not_found(movie_id))?;

    Ok(Json(result.map(|credits| CreditsView::new(credits, &state.images))))
}

pub async fn similar(
    State(state): State<AppState>,
    Path(movie_id): Path<u64>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<QueryResult<Paginated<Movie>>>> {
    let result = state
        .queries
        .similar_movies(movie_id, params.page)
        .await
        .map_err(movie_not_found(movie_id))?;

    Ok(Json(result))
}
