//! Locally persisted movie collections
//!
//! Both stores keep their whole list in memory, mutate it synchronously and
//! queue the full serialized list for persistence after every change. A
//! missing or unreadable persisted value loads as an empty collection.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{db::Storage, db::PersistenceWriter};

pub mod recently_viewed;
pub mod watch_later;

pub use recently_viewed::{RecentlyViewedStore, MAX_RECENTLY_VIEWED, RECENTLY_VIEWED_KEY};
pub use watch_later::{WatchLaterStore, WATCH_LATER_KEY};

/// Accepted layouts of a persisted collection
#[derive(Deserialize)]
#[serde(untagged)]
enum PersistedList<E> {
    Plain(Vec<E>),
    /// `{"state": {"movies": [...]}, "version": 0}` as written by older front ends
    Envelope { state: PersistedState<E> },
}

#[derive(Deserialize)]
struct PersistedState<E> {
    #[serde(default = "Vec::new")]
    movies: Vec<E>,
}

/// Reads the list stored under `key`, treating anything unusable as empty
async fn load_list<E: DeserializeOwned>(storage: &dyn Storage, key: &str) -> Vec<E> {
    let raw = match storage.read(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!(key = %key, backend = storage.name(), error = %e, "Collection storage unavailable, starting empty");
            return Vec::new();
        }
    };

    match serde_json::from_str::<PersistedList<E>>(&raw) {
        Ok(PersistedList::Plain(movies)) => movies,
        Ok(PersistedList::Envelope { state }) => state.movies,
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Persisted collection is corrupted, starting empty");
            Vec::new()
        }
    }
}

/// Queues the full list for persistence
fn persist_list<E: Serialize>(writer: &PersistenceWriter, key: &str, movies: &[E]) {
    match serde_json::to_string(movies) {
        Ok(json) => writer.persist(key, json),
        Err(e) => tracing::error!(key = %key, error = %e, "Collection serialization error"),
    }
}

/// Keeps the first entry seen for each id
fn dedupe_by_id<E>(movies: &mut Vec<E>, id: impl Fn(&E) -> u64) {
    let mut seen = std::collections::HashSet::new();
    movies.retain(|m| seen.insert(id(m)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStorage;
    use crate::models::WatchLaterEntry;

    #[tokio::test]
    async fn test_missing_value_loads_empty() {
        let storage = MemoryStorage::new();
        let movies: Vec<WatchLaterEntry> = load_list(&storage, "nothing-here").await;
        assert!(movies.is_empty());
    }

    #[tokio::test]
    async fn test_corrupted_value_loads_empty() {
        let storage = MemoryStorage::new();
        storage.write("k", "{not json").await.unwrap();
        let movies: Vec<WatchLaterEntry> = load_list(&storage, "k").await;
        assert!(movies.is_empty());
    }

    #[tokio::test]
    async fn test_envelope_layout_loads() {
        let storage = MemoryStorage::new();
        storage
            .write(
                "k",
                r#"{"state":{"movies":[{"id":1,"title":"A","posterPath":null,"rating":7.1,"releaseDate":"2001-01-01","addedAt":5}]},"version":0}"#,
            )
            .await
            .unwrap();

        let movies: Vec<WatchLaterEntry> = load_list(&storage, "k").await;
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].movie.title, "A");
    }

    #[test]
    fn test_dedupe_keeps_first() {
        let mut ids = vec![3_u64, 1, 3, 2, 1];
        dedupe_by_id(&mut ids, |id| *id);
        assert_eq!(ids, vec![3, 1, 2]);
    }
}
