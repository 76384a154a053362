use std::sync::Arc;

use crate::{
    clock::Clock,
    collections::{RecentlyViewedStore, WatchLaterStore},
    db::{PersistenceWriter, QueryCache, Storage},
    services::{ImageUrls, MovieCatalog, MovieQueries},
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub queries: MovieQueries,
    pub recently_viewed: Arc<RecentlyViewedStore>,
    pub watch_later: Arc<WatchLaterStore>,
    pub images: ImageUrls,
}

impl AppState {
    /// Wires the query cache in front of `catalog` and rehydrates both
    /// collections from `storage`
    pub async fn new(
        catalog: Arc<dyn MovieCatalog>,
        storage: &dyn Storage,
        writer: PersistenceWriter,
        images: ImageUrls,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let queries = MovieQueries::new(QueryCache::new(Arc::clone(&clock)), catalog);
        let recently_viewed =
            RecentlyViewedStore::load(storage, writer.clone(), Arc::clone(&clock)).await;
        let watch_later = WatchLaterStore::load(storage, writer, clock).await;

        Self {
            queries,
            recently_viewed: Arc::new(recently_viewed),
            watch_later: Arc::new(watch_later),
            images,
        }
    }
}
