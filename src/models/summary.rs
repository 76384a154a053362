use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Movie, MovieDetails};

/// Compact movie record kept in the local collections
///
/// Serialized as `{id, title, poster_path, rating, release_date}`. Older
/// records written with `posterPath`, `posterUrl`, `vote_average`,
/// `releaseDate` or `year` are normalized into this shape when read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "StoredRecord")]
pub struct MovieSummary {
    pub id: u64,
    pub title: String,
    pub poster_path: Option<String>,
    pub rating: f64,
    pub release_date: String,
}

/// Entry in the recently viewed history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "StoredRecord")]
pub struct RecentlyViewedEntry {
    #[serde(flatten)]
    pub movie: MovieSummary,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub viewed_at: DateTime<Utc>,
}

/// Entry in the watch later list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "StoredRecord")]
pub struct WatchLaterEntry {
    #[serde(flatten)]
    pub movie: MovieSummary,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub added_at: DateTime<Utc>,
}

impl RecentlyViewedEntry {
    pub fn id(&self) -> u64 {
        self.movie.id
    }
}

impl WatchLaterEntry {
    pub fn id(&self) -> u64 {
        self.movie.id
    }
}

/// Every field name any version of the collections has written
#[derive(Deserialize)]
struct StoredRecord {
    id: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, alias = "posterPath")]
    poster_path: Option<String>,
    #[serde(default, rename = "posterUrl")]
    poster_url: Option<String>,
    #[serde(default, alias = "vote_average")]
    rating: Option<f64>,
    #[serde(default, alias = "releaseDate")]
    release_date: Option<String>,
    #[serde(default)]
    year: Option<i32>,
    #[serde(
        default,
        alias = "viewed_at",
        alias = "viewedAt",
        alias = "added_at",
        alias = "addedAt"
    )]
    stamped_at: Option<i64>,
}

impl StoredRecord {
    fn timestamp(&self) -> DateTime<Utc> {
        self.stamped_at
            .and_then(DateTime::from_timestamp_millis)
            .unwrap_or_default()
    }
}

/// Reduces a full image URL to the catalog path it was built from
fn path_from_url(url: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() || url.starts_with("/placeholder") {
        return None;
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.rfind('/').map(|idx| url[idx..].to_string());
    }
    Some(url.to_string())
}

impl From<StoredRecord> for MovieSummary {
    fn from(record: StoredRecord) -> Self {
        let poster_path = record
            .poster_path
            .filter(|p| !p.trim().is_empty())
            .or_else(|| record.poster_url.as_deref().and_then(path_from_url));

        let release_date = match record.release_date {
            Some(date) if !date.is_empty() => date,
            _ => match record.year {
                Some(year) if year > 0 => format!("{:04}-01-01", year),
                _ => String::new(),
            },
        };

        Self {
            id: record.id,
            title: record.title.unwrap_or_default(),
            poster_path,
            rating: record.rating.unwrap_or_default().clamp(0.0, 10.0),
            release_date,
        }
    }
}

impl From<StoredRecord> for RecentlyViewedEntry {
    fn from(record: StoredRecord) -> Self {
        let viewed_at = record.timestamp();
        Self {
            movie: record.into(),
            viewed_at,
        }
    }
}

impl From<StoredRecord> for WatchLaterEntry {
    fn from(record: StoredRecord) -> Self {
        let added_at = record.timestamp();
        Self {
            movie: record.into(),
            added_at,
        }
    }
}

impl From<&Movie> for MovieSummary {
    fn from(movie: &Movie) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            poster_path: movie.poster_path.clone(),
            rating: movie.vote_average,
            release_date: movie.release_date.clone(),
        }
    }
}

impl From<&MovieDetails> for MovieSummary {
    fn from(details: &MovieDetails) -> Self {
        Self {
            id: details.id,
            title: details.title.clone(),
            poster_path: details.poster_path.clone(),
            rating: details.vote_average,
            release_date: details.release_date.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical() -> MovieSummary {
        MovieSummary {
            id: 680,
            title: "Pulp Fiction".to_string(),
            poster_path: Some("/d5iIlFn5s0ImszYzBPb8JPIfbXD.jpg".to_string()),
            rating: 8.5,
            release_date: "1994-09-10".to_string(),
        }
    }

    #[test]
    fn test_canonical_shape_round_trips() {
        let json = serde_json::to_value(canonical()).unwrap();
        assert_eq!(json["poster_path"], "/d5iIlFn5s0ImszYzBPb8JPIfbXD.jpg");
        assert_eq!(json["rating"], 8.5);

        let back: MovieSummary = serde_json::from_value(json).unwrap();
        assert_eq!(back, canonical());
    }

    #[test]
    fn test_catalog_shape_normalizes() {
        let json = r#"{
            "id": 680,
            "title": "Pulp Fiction",
            "poster_path": "/d5iIlFn5s0ImszYzBPb8JPIfbXD.jpg",
            "vote_average": 8.5,
            "release_date": "1994-09-10"
        }"#;
        let summary: MovieSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary, canonical());
    }

    #[test]
    fn test_camel_case_store_shape_normalizes() {
        let json = r#"{
            "id": 680,
            "title": "Pulp Fiction",
            "posterPath": "/d5iIlFn5s0ImszYzBPb8JPIfbXD.jpg",
            "rating": 8.5,
            "releaseDate": "1994-09-10",
            "viewedAt": 1700000000000
        }"#;
        let summary: MovieSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary, canonical());
    }

    #[test]
    fn test_card_shape_normalizes() {
        let json = r#"{
            "id": 680,
            "title": "Pulp Fiction",
            "posterUrl": "https://image.tmdb.org/t/p/w500/d5iIlFn5s0ImszYzBPb8JPIfbXD.jpg",
            "rating": 8.5,
            "year": 1994
        }"#;
        let summary: MovieSummary = serde_json::from_str(json).unwrap();
        assert_eq!(
            summary.poster_path.as_deref(),
            Some("/d5iIlFn5s0ImszYzBPb8JPIfbXD.jpg")
        );
        assert_eq!(summary.release_date, "1994-01-01");
    }

    #[test]
    fn test_placeholder_url_becomes_none() {
        let json = r#"{"id": 1, "title": "X", "posterUrl": "/placeholder-movie.svg", "rating": 3, "year": 0}"#;
        let summary: MovieSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.poster_path, None);
        assert_eq!(summary.release_date, "");
    }

    #[test]
    fn test_rating_is_clamped() {
        let json = r#"{"id": 1, "title": "X", "rating": 42.0}"#;
        let summary: MovieSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.rating, 10.0);
    }

    #[test]
    fn test_entry_timestamps_use_millis() {
        let entry = RecentlyViewedEntry {
            movie: canonical(),
            viewed_at: DateTime::from_timestamp_millis(1_700_000_000_123).unwrap(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["viewed_at"], 1_700_000_000_123_i64);
        assert_eq!(json["id"], 680);

        let back: RecentlyViewedEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_legacy_watch_later_entry() {
        let json = r#"{
            "id": 13,
            "title": "Forrest Gump",
            "posterPath": null,
            "rating": 8.5,
            "releaseDate": "1994-06-23",
            "addedAt": 1700000000000
        }"#;
        let entry: WatchLaterEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.id(), 13);
        assert_eq!(entry.added_at.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(entry.movie.poster_path, None);
    }

    #[test]
    fn test_from_details() {
        let details: MovieDetails = serde_json::from_str(
            r#"{"id": 680, "title": "Pulp Fiction", "poster_path": "/d5iIlFn5s0ImszYzBPb8JPIfbXD.jpg", "vote_average": 8.5, "release_date": "1994-09-10"}"#,
        )
        .unwrap();
        assert_eq!(MovieSummary::from(&details), canonical());
    }
}
