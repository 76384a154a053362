use serde_json::json;
use tokio_test::assert_ok;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

use cinetrack::{
    models::{SortDirection, SortField, SortKey},
    services::{MovieCatalog, TmdbClient},
};

fn movie_json(id: u64) -> serde_json::Value {
    json!({
        "id": id,
        "title": format!("Movie {}", id),
        "poster_path": format!("/{}.jpg", id),
        "backdrop_path": null,
        "vote_average": 7.2,
        "vote_count": 1200,
        "release_date": "2021-03-04",
        "overview": "",
        "genre_ids": [28, 12],
        "popularity": 55.1,
        "adult": false
    })
}

fn page_json(page: u32, ids: std::ops::RangeInclusive<u64>) -> serde_json::Value {
    json!({
        "page": page,
        "results": ids.map(movie_json).collect::<Vec<_>>(),
        "total_pages": 500,
        "total_results": 10000
    })
}

fn create_test_client(server: &MockServer) -> TmdbClient {
    TmdbClient::new("test-key".to_string(), server.uri())
}

#[tokio::test]
async fn test_every_request_carries_the_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/top_rated"))
        .and(query_param("api_key", "test-key"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(2, 1..=20)))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let page = assert_ok!(client.fetch_top_rated(2).await);

    assert_eq!(page.page, 2);
    assert_eq!(page.results.len(), 20);
    assert_eq!(page.results[0].genre_ids, vec![28, 12]);
}

#[tokio::test]
async fn test_language_is_forwarded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/genre/movie/list"))
        .and(query_param("language", "de-DE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "genres": [{"id": 28, "name": "Action"}, {"id": 18, "name": "Drama"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server).with_language(Some("de-DE".to_string()));
    let genres = assert_ok!(client.fetch_genres().await);

    assert_eq!(genres.len(), 2);
    assert_eq!(genres.name_of(18), Some("Drama"));
}

#[tokio::test]
async fn test_discover_by_genre_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .and(query_param("with_genres", "28"))
        .and(query_param("page", "1"))
        .and(query_param("sort_by", "release_date.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(1, 1..=5)))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let sort = SortKey::new(SortField::ReleaseDate, SortDirection::Asc);
    let page = assert_ok!(client.fetch_by_genre(28, 1, sort).await);

    assert_eq!(page.results.len(), 5);
}

#[tokio::test]
async fn test_search_sends_trimmed_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .and(query_param("query", "blade runner"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(1, 1..=2)))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let page = assert_ok!(client.fetch_search("  blade runner ", 1).await);
    assert_eq!(page.results.len(), 2);
}

#[tokio::test]
async fn test_not_found_status_is_preserved() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/999999"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "status_code": 34,
            "status_message": "The resource you requested could not be found."
        })))
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let err = client.fetch_details(999999).await.unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.operation, "movie details");
    assert_eq!(err.user_message(), "Failed to load movie details");
}

#[tokio::test]
async fn test_server_error_is_a_fetch_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/550/credits"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let err = client.fetch_credits(550).await.unwrap_err();

    assert_eq!(err.status, Some(503));
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn test_malformed_body_is_a_fetch_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/popular"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let err = client.fetch_popular(1).await.unwrap_err();

    assert_eq!(err.operation, "popular movies");
    assert!(err.message.contains("Failed to parse response"));
}

#[tokio::test]
async fn test_details_with_null_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/550"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 550,
            "title": "Fight Club",
            "poster_path": null,
            "backdrop_path": null,
            "vote_average": 8.4,
            "release_date": "1999-10-15",
            "overview": null,
            "runtime": null,
            "genres": [{"id": 18, "name": "Drama"}],
            "tagline": null,
            "budget": 63000000,
            "revenue": null,
            "status": "Released"
        })))
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let details = assert_ok!(client.fetch_details(550).await);

    assert_eq!(details.title, "Fight Club");
    assert_eq!(details.overview, "");
    assert_eq!(details.runtime, None);
    assert_eq!(details.revenue, 0);
    assert_eq!(details.genres.len(), 1);
}

#[tokio::test]
async fn test_similar_movies_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/550/similar"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(3, 41..=60)))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let page = assert_ok!(client.fetch_similar(550, 3).await);

    assert_eq!(page.page, 3);
    assert_eq!(page.results.first().map(|m| m.id), Some(41));
}
