//! TMDB-compatible catalog client
//!
//! Plain read-only v3 REST calls. The API key travels as the `api_key` query
//! parameter on every request, never in logs.
//!
//! Endpoints:
//! - `/genre/movie/list`
//! - `/movie/top_rated`, `/movie/popular`
//! - `/discover/movie?with_genres=&sort_by=`
//! - `/search/movie?query=`
//! - `/movie/{id}`, `/movie/{id}/credits`, `/movie/{id}/similar`

use crate::{
    config::Config,
    error::RemoteFetchError,
    models::{Credits, GenreCatalog, Movie, MovieDetails, Paginated, SortKey},
    services::providers::{FetchResult, MovieCatalog},
};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;

const PROVIDER_NAME: &str = "tmdb";

#[derive(Clone)]
pub struct TmdbClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    language: Option<String>,
}

impl TmdbClient {
    pub fn new(api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            language: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.tmdb_api_key.clone(), config.tmdb_base_url.clone())
            .with_language(config.tmdb_language.clone())
    }

    /// Sends `language=<lang>` with every request
    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language.filter(|l| !l.trim().is_empty());
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    fn query_params(&self, params: &[(&'static str, String)]) -> Vec<(&'static str, String)> {
        let mut query = vec![("api_key", self.api_key.clone())];
        if let Some(language) = &self.language {
            query.push(("language", language.clone()));
        }
        query.extend(params.iter().cloned());
        query
    }

    /// Issues one GET and decodes the body
    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        params: &[(&'static str, String)],
    ) -> FetchResult<T> {
        let url = self.endpoint(path);

        tracing::debug!(
            operation = operation,
            path = %path,
            provider = PROVIDER_NAME,
            "Fetching from catalog"
        );

        let response = self
            .http_client
            .get(&url)
            .query(&self.query_params(params))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(operation = operation, error = %e, "Catalog request failed");
                RemoteFetchError::new(operation, e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                operation = operation,
                path = %path,
                status = %status,
                body = %body,
                "Catalog returned an error status"
            );
            return Err(RemoteFetchError::new(
                operation,
                format!("API returned status {}: {}", status, body),
            )
            .with_status(status.as_u16()));
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| RemoteFetchError::new(operation, e.to_string()))?;

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                operation = operation,
                error = %e,
                response = %response_text,
                "Failed to deserialize catalog response"
            );
            RemoteFetchError::new(operation, format!("Failed to parse response: {}", e))
        })
    }
}

#[async_trait::async_trait]
impl MovieCatalog for TmdbClient {
    async fn fetch_genres(&self) -> FetchResult<GenreCatalog> {
        let catalog: GenreCatalog = self.get_json("genres", "/genre/movie/list", &[]).await?;
        tracing::info!(genres = catalog.len(), provider = PROVIDER_NAME, "Genres fetched");
        Ok(catalog)
    }

    async fn fetch_top_rated(&self, page: u32) -> FetchResult<Paginated<Movie>> {
        self.get_json(
            "top rated movies",
            "/movie/top_rated",
            &[("page", page.to_string())],
        )
        .await
    }

    async fn fetch_popular(&self, page: u32) -> FetchResult<Paginated<Movie>> {
        self.get_json(
            "popular movies",
            "/movie/popular",
            &[("page", page.to_string())],
        )
        .await
    }

    async fn fetch_by_genre(
        &self,
        genre_id: u32,
        page: u32,
        sort: SortKey,
    ) -> FetchResult<Paginated<Movie>> {
        self.get_json(
            "genre movies",
            "/discover/movie",
            &[
                ("with_genres", genre_id.to_string()),
                ("page", page.to_string()),
                ("sort_by", sort.to_string()),
            ],
        )
        .await
    }

    async fn fetch_search(&self, query: &str, page: u32) -> FetchResult<Paginated<Movie>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(RemoteFetchError::new(
                "search results",
                "Search query cannot be empty",
            ));
        }

        let results: Paginated<Movie> = self
            .get_json(
                "search results",
                "/search/movie",
                &[("query", query.to_string()), ("page", page.to_string())],
            )
            .await?;

        tracing::info!(
            query = %query,
            results = results.results.len(),
            provider = PROVIDER_NAME,
            "Movie search completed"
        );

        Ok(results)
    }

    async fn fetch_details(&self, movie_id: u64) -> FetchResult<MovieDetails> {
        self.get_json("movie details", &format!("/movie/{}", movie_id), &[])
            .await
    }

    async fn fetch_credits(&self, movie_id: u64) -> FetchResult<Credits> {
        self.get_json(
            "movie credits",
            &format!("/movie/{}/credits", movie_id),
            &[],
        )
        .await
    }

    async fn fetch_similar(&self, movie_id: u64, page: u32) -> FetchResult<Paginated<Movie>> {
        self.get_json(
            "similar movies",
            &format!("/movie/{}/similar", movie_id),
            &[("page", page.to_string())],
        )
        .await
    }

    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }
}
