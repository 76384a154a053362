use parking_lot::Mutex;
use std::sync::Arc;

use super::{dedupe_by_id, load_list, persist_list};
use crate::{
    clock::Clock,
    db::{PersistenceWriter, Storage},
    models::{MovieSummary, RecentlyViewedEntry},
};

/// Storage key of the viewing history
pub const RECENTLY_VIEWED_KEY: &str = "recently-viewed-movies";

/// Entries kept in the viewing history
pub const MAX_RECENTLY_VIEWED: usize = 20;

/// Viewing history, most recent first
///
/// Holds at most one entry per movie and at most [`MAX_RECENTLY_VIEWED`]
/// entries. Viewing a movie again moves it back to the front.
pub struct RecentlyViewedStore {
    movies: Mutex<Vec<RecentlyViewedEntry>>,
    writer: PersistenceWriter,
    clock: Arc<dyn Clock>,
}

impl RecentlyViewedStore {
    /// Rehydrates the history persisted in `storage`
    pub async fn load(
        storage: &dyn Storage,
        writer: PersistenceWriter,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut movies: Vec<RecentlyViewedEntry> = load_list(storage, RECENTLY_VIEWED_KEY).await;
        dedupe_by_id(&mut movies, RecentlyViewedEntry::id);
        movies.sort_by(|a, b| b.viewed_at.cmp(&a.viewed_at));
        movies.truncate(MAX_RECENTLY_VIEWED);

        tracing::info!(entries = movies.len(), "Recently viewed loaded");

        Self {
            movies: Mutex::new(movies),
            writer,
            clock,
        }
    }

    /// Records a view of `movie`
    pub fn add_movie(&self, movie: MovieSummary) {
        let mut movies = self.movies.lock();
        movies.retain(|m| m.id() != movie.id);

        tracing::debug!(movie_id = movie.id, "Recording recently viewed");
        movies.insert(
            0,
            RecentlyViewedEntry {
                movie,
                viewed_at: self.clock.now(),
            },
        );
        movies.truncate(MAX_RECENTLY_VIEWED);

        persist_list(&self.writer, RECENTLY_VIEWED_KEY, &movies);
    }

    /// Empties the collection and deletes its persisted value
    pub fn clear_all(&self) {
        let mut movies = self.movies.lock();
        movies.clear();
        self.writer.remove(RECENTLY_VIEWED_KEY);
        tracing::info!("Recently viewed cleared");
    }

    /// Snapshot of the history, most recent first
    pub fn movies(&self) -> Vec<RecentlyViewedEntry> {
        self.movies.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.movies.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.lock().is_empty()
    }
}
