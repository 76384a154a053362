//! Movie catalog provider abstraction
//!
//! The query layer only talks to this trait.

use crate::{
    error::RemoteFetchError,
    models::{Credits, GenreCatalog, Movie, MovieDetails, Paginated, SortKey},
};

pub mod tmdb;

pub use tmdb::TmdbClient;

pub type FetchResult<T> = Result<T, RemoteFetchError>;

/// Read-only access to a movie metadata service
///
/// Every operation is a single request. Failures are reported as-is; there is
/// no retry and no partial result.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MovieCatalog: Send + Sync {
    /// Genre id → name reference data
    async fn fetch_genres(&self) -> FetchResult<GenreCatalog>;

    async fn fetch_top_rated(&self, page: u32) -> FetchResult<Paginated<Movie>>;

    async fn fetch_popular(&self, page: u32) -> FetchResult<Paginated<Movie>>;

    /// Discovery listing restricted to one genre
    async fn fetch_by_genre(
        &self,
        genre_id: u32,
        page: u32,
        sort: SortKey,
    ) -> FetchResult<Paginated<Movie>>;

    /// Title search. Callers must not pass an empty or blank query.
    async fn fetch_search(&self, query: &str, page: u32) -> FetchResult<Paginated<Movie>>;

    async fn fetch_details(&self, movie_id: u64) -> FetchResult<MovieDetails>;

    async fn fetch_credits(&self, movie_id: u64) -> FetchResult<Credits>;

    async fn fetch_similar(&self, movie_id: u64, page: u32) -> FetchResult<Paginated<Movie>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
