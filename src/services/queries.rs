use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::{future::Future, sync::Arc, time::Duration};

use crate::{
    db::{Cached, QueryCache, QueryKey},
    models::{Credits, GenreCatalog, Movie, MovieDetails, Paginated, SortKey},
    services::providers::{FetchResult, MovieCatalog},
};

/// Genres change rarely, so they are treated as reference data
pub const GENRES_STALE_TIME: Duration = Duration::from_secs(24 * 60 * 60);
pub const LIST_STALE_TIME: Duration = Duration::from_secs(5 * 60);
pub const DETAILS_STALE_TIME: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    /// Required parameters were missing, nothing was requested
    Disabled,
    Success,
}

/// Outcome of one query through the cache
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult<T> {
    #[serde(skip)]
    pub key: Option<QueryKey>,
    pub status: QueryStatus,
    pub data: Option<T>,
    pub is_stale: bool,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl<T> QueryResult<T> {
    pub fn disabled() -> Self {
        Self {
            key: None,
            status: QueryStatus::Disabled,
            data: None,
            is_stale: false,
            fetched_at: None,
        }
    }

    fn success(key: QueryKey, cached: Cached<T>) -> Self {
        Self {
            key: Some(key),
            status: QueryStatus::Success,
            data: Some(cached.value),
            is_stale: cached.is_stale,
            fetched_at: Some(cached.fetched_at),
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.status == QueryStatus::Disabled
    }

    /// Converts the payload, keeping status and freshness
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryResult<U> {
        QueryResult {
            key: self.key,
            status: self.status,
            data: self.data.map(f),
            is_stale: self.is_stale,
            fetched_at: self.fetched_at,
        }
    }
}

/// Typed access to the catalog through the query cache
///
/// Each method derives its [`QueryKey`] from its parameters. When the
/// parameters can't form a valid request the result is
/// [`QueryStatus::Disabled`] and the catalog is never called.
#[derive(Clone)]
pub struct MovieQueries {
    cache: QueryCache,
    catalog: Arc<dyn MovieCatalog>,
}

impl MovieQueries {
    pub fn new(cache: QueryCache, catalog: Arc<dyn MovieCatalog>) -> Self {
        Self { cache, catalog }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub async fn genres(&self) -> FetchResult<QueryResult<GenreCatalog>> {
        let catalog = Arc::clone(&self.catalog);
        self.run(Some(QueryKey::Genres), GENRES_STALE_TIME, move || async move {
            catalog.fetch_genres().await
        })
        .await
    }

    pub async fn top_rated(&self, page: u32) -> FetchResult<QueryResult<Paginated<Movie>>> {
        let catalog = Arc::clone(&self.catalog);
        self.run(QueryKey::top_rated(page), LIST_STALE_TIME, move || async move {
            catalog.fetch_top_rated(page).await
        })
        .await
    }

    pub async fn popular(&self, page: u32) -> FetchResult<QueryResult<Paginated<Movie>>> {
        let catalog = Arc::clone(&self.catalog);
        self.run(QueryKey::popular(page), LIST_STALE_TIME, move || async move {
            catalog.fetch_popular(page).await
        })
        .await
    }

    pub async fn movies_by_genre(
        &self,
        genre_id: u32,
        page: u32,
        sort: SortKey,
    ) -> FetchResult<QueryResult<Paginated<Movie>>> {
        let catalog = Arc::clone(&self.catalog);
        self.run(
            QueryKey::by_genre(genre_id, page, sort),
            LIST_STALE_TIME,
            move || async move { catalog.fetch_by_genre(genre_id, page, sort).await },
        )
        .await
    }

    pub async fn search(&self, query: &str, page: u32) -> FetchResult<QueryResult<Paginated<Movie>>> {
        let catalog = Arc::clone(&self.catalog);
        let query = query.trim().to_string();
        self.run(QueryKey::search(&query, page), LIST_STALE_TIME, move || async move {
            catalog.fetch_search(&query, page).await
        })
        .await
    }

    pub async fn movie_details(&self, movie_id: u64) -> FetchResult<QueryResult<MovieDetails>> {
        let catalog = Arc::clone(&self.catalog);
        self.run(QueryKey::details(movie_id), DETAILS_STALE_TIME, move || async move {
            catalog.fetch_details(movie_id).await
        })
        .await
    }

    pub async fn movie_credits(&self, movie_id: u64) -> FetchResult<QueryResult<Credits>> {
        let catalog = Arc::clone(&self.catalog);
        self.run(QueryKey::credits(movie_id), DETAILS_STALE_TIME, move || async move {
            catalog.fetch_credits(movie_id).await
        })
        .await
    }

    pub async fn similar_movies(
        &self,
        movie_id: u64,
        page: u32,
    ) -> FetchResult<QueryResult<Paginated<Movie>>> {
        let catalog = Arc::clone(&self.catalog);
        self.run(QueryKey::similar(movie_id, page), LIST_STALE_TIME, move || async move {
            catalog.fetch_similar(movie_id, page).await
        })
        .await
    }

    async fn run<T, F, Fut>(
        &self,
        key: Option<QueryKey>,
        window: Duration,
        fetcher: F,
    ) -> FetchResult<QueryResult<T>>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = FetchResult<T>> + Send + 'static,
    {
        let Some(key) = key else {
            tracing::debug!(provider = self.catalog.name(), "Query disabled, missing parameters");
            return Ok(QueryResult::disabled());
        };

        let cached = self.cache.fetch(key.clone(), window, fetcher).await?;
        Ok(QueryResult::success(key, cached))
    }
}
