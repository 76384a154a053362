use parking_lot::Mutex;
use std::sync::Arc;

use super::{dedupe_by_id, load_list, persist_list};
use crate::{
    clock::Clock,
    db::{PersistenceWriter, Storage},
    models::{MovieSummary, WatchLaterEntry},
};

/// Storage key of the watch later list
pub const WATCH_LATER_KEY: &str = "watch-later-movies";

/// User-curated bookmarks, most recently added first
///
/// Only changed by explicit user action. Adding a movie that is already
/// bookmarked leaves the list untouched.
pub struct WatchLaterStore {
    movies: Mutex<Vec<WatchLaterEntry>>,
    writer: PersistenceWriter,
    clock: Arc<dyn Clock>,
}

impl WatchLaterStore {
    /// Rehydrates the bookmarks persisted in `storage`
    pub async fn load(
        storage: &dyn Storage,
        writer: PersistenceWriter,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut movies: Vec<WatchLaterEntry> = load_list(storage, WATCH_LATER_KEY).await;
        dedupe_by_id(&mut movies, WatchLaterEntry::id);
        movies.sort_by(|a, b| b.added_at.cmp(&a.added_at));

        tracing::info!(entries = movies.len(), "Watch later loaded");

        Self {
            movies: Mutex::new(movies),
            writer,
            clock,
        }
    }

    /// Bookmarks `movie`. Returns false if it was already bookmarked.
    pub fn add_movie(&self, movie: MovieSummary) -> bool {
        let mut movies = self.movies.lock();
        if movies.iter().any(|m| m.id() == movie.id) {
            return false;
        }

        tracing::info!(movie_id = movie.id, "Added to watch later");
        movies.insert(
            0,
            WatchLaterEntry {
                movie,
                added_at: self.clock.now(),
            },
        );
        persist_list(&self.writer, WATCH_LATER_KEY, &movies);
        true
    }

    /// Removes the bookmark for `movie_id`. Returns false if there was none.
    pub fn remove_movie(&self, movie_id: u64) -> bool {
        let mut movies = self.movies.lock();
        let before = movies.len();
        movies.retain(|m| m.id() != movie_id);
        if movies.len() == before {
            return false;
        }

        tracing::info!(movie_id = movie_id, "Removed from watch later");
        persist_list(&self.writer, WATCH_LATER_KEY, &movies);
        true
    }

    /// Flips the bookmark for `movie` and returns whether it is now bookmarked
    pub fn toggle(&self, movie: MovieSummary) -> bool {
        let mut movies = self.movies.lock();
        let movie_id = movie.id;

        let added = match movies.iter().position(|m| m.id() == movie_id) {
            Some(index) => {
                movies.remove(index);
                false
            }
            None => {
                movies.insert(
                    0,
                    WatchLaterEntry {
                        movie,
                        added_at: self.clock.now(),
                    },
                );
                true
            }
        };

        tracing::info!(movie_id = movie_id, added = added, "Toggled watch later");
        persist_list(&self.writer, WATCH_LATER_KEY, &movies);
        added
    }

    pub fn is_in_watch_later(&self, movie_id: u64) -> bool {
        self.movies.lock().iter().any(|m| m.id() == movie_id)
    }

    /// Empties the collection and deletes its persisted value
    pub fn clear_all(&self) {
        let mut movies = self.movies.lock();
        movies.clear();
        self.writer.remove(WATCH_LATER_KEY);
        tracing::info!("Watch later cleared");
    }

    /// Snapshot of the bookmarks, most recently added first
    pub fn movies(&self) -> Vec<WatchLaterEntry> {
        self.movies.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.movies.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.lock().is_empty()
    }
}
