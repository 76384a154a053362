use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use std::{
    collections::HashMap,
    fmt::Display,
    future::Future,
    sync::{Arc, Weak},
    time::Duration,
};

use crate::{clock::Clock, error::RemoteFetchError, models::SortKey};

/// Identifies one catalog response: the operation plus every parameter that
/// changes what comes back
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Genres,
    TopRated { page: u32 },
    Popular { page: u32 },
    ByGenre { genre_id: u32, page: u32, sort: SortKey },
    Search { query: String, page: u32 },
    Details { movie_id: u64 },
    Credits { movie_id: u64 },
    Similar { movie_id: u64, page: u32 },
}

impl QueryKey {
    // Constructors return `None` when the parameters can't produce a request.

    pub fn top_rated(page: u32) -> Option<Self> {
        (page > 0).then_some(QueryKey::TopRated { page })
    }

    pub fn popular(page: u32) -> Option<Self> {
        (page > 0).then_some(QueryKey::Popular { page })
    }

    pub fn by_genre(genre_id: u32, page: u32, sort: SortKey) -> Option<Self> {
        (genre_id > 0 && page > 0).then_some(QueryKey::ByGenre {
            genre_id,
            page,
            sort,
        })
    }

    pub fn search(query: &str, page: u32) -> Option<Self> {
        let query = query.trim();
        (!query.is_empty() && page > 0).then(|| QueryKey::Search {
            query: query.to_string(),
            page,
        })
    }

    pub fn details(movie_id: u64) -> Option<Self> {
        (movie_id > 0).then_some(QueryKey::Details { movie_id })
    }

    pub fn credits(movie_id: u64) -> Option<Self> {
        (movie_id > 0).then_some(QueryKey::Credits { movie_id })
    }

    pub fn similar(movie_id: u64, page: u32) -> Option<Self> {
        (movie_id > 0 && page > 0).then_some(QueryKey::Similar { movie_id, page })
    }

    /// Operation name used in failure messages
    pub fn operation(&self) -> &'static str {
        match self {
            QueryKey::Genres => "genres",
            QueryKey::TopRated { .. } => "top rated movies",
            QueryKey::Popular { .. } => "popular movies",
            QueryKey::ByGenre { .. } => "genre movies",
            QueryKey::Search { .. } => "search results",
            QueryKey::Details { .. } => "movie details",
            QueryKey::Credits { .. } => "movie credits",
            QueryKey::Similar { .. } => "similar movies",
        }
    }
}

impl Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryKey::Genres => write!(f, "genres"),
            QueryKey::TopRated { page } => write!(f, "movies:top-rated:{}", page),
            QueryKey::Popular { page } => write!(f, "movies:popular:{}", page),
            QueryKey::ByGenre {
                genre_id,
                page,
                sort,
            } => write!(f, "movies:genre:{}:{}:{}", genre_id, page, sort),
            QueryKey::Search { query, page } => write!(f, "movies:search:{}:{}", query, page),
            QueryKey::Details { movie_id } => write!(f, "movie:details:{}", movie_id),
            QueryKey::Credits { movie_id } => write!(f, "movie:credits:{}", movie_id),
            QueryKey::Similar { movie_id, page } => {
                write!(f, "movie:similar:{}:{}", movie_id, page)
            }
        }
    }
}

/// A stored response
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: QueryKey,
    pub value: Arc<serde_json::Value>,
    pub fetched_at: DateTime<Utc>,
}

/// Whether `entry` has outlived its staleness window at `now`
pub fn is_stale(entry: &CacheEntry, now: DateTime<Utc>, window: Duration) -> bool {
    match (now - entry.fetched_at).to_std() {
        Ok(age) => age >= window,
        // fetched "in the future": clock went backwards
        Err(_) => false,
    }
}

/// A decoded cache hit
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<T> {
    pub value: T,
    pub fetched_at: DateTime<Utc>,
    /// Served from an expired entry while a refresh runs
    pub is_stale: bool,
}

/// How long an entry outlives its staleness window before it is evicted
pub const DEFAULT_GC_TIME: Duration = Duration::from_secs(5 * 60);

type Flight = Shared<BoxFuture<'static, Result<CacheEntry, RemoteFetchError>>>;

struct InFlight {
    seq: u64,
    future: Flight,
}

#[derive(Default)]
struct Slot {
    entry: Option<CacheEntry>,
    /// Sequence number of the request that produced `entry`
    entry_seq: u64,
    invalidated: bool,
    flight: Option<InFlight>,
    /// Last sequence number handed out for this key
    issued: u64,
    /// Staleness window of the most recent read
    window: Duration,
}

impl Slot {
    fn is_evictable(&self, now: DateTime<Utc>, gc_time: Duration) -> bool {
        if self.flight.is_some() {
            return false;
        }
        match &self.entry {
            Some(entry) => is_stale(entry, now, self.window + gc_time),
            None => true,
        }
    }
}

struct Inner {
    slots: Mutex<HashMap<QueryKey, Slot>>,
    clock: Arc<dyn Clock>,
    gc_time: Duration,
    last_sweep: Mutex<DateTime<Utc>>,
}

impl Inner {
    /// Drops idle slots whose entry expired more than `gc_time` ago, at most
    /// once per `gc_time`
    fn sweep(&self, slots: &mut HashMap<QueryKey, Slot>, now: DateTime<Utc>) {
        {
            let mut last_sweep = self.last_sweep.lock();
            match (now - *last_sweep).to_std() {
                Ok(since) if since >= self.gc_time => *last_sweep = now,
                _ => return,
            }
        }

        let before = slots.len();
        slots.retain(|_, slot| !slot.is_evictable(now, self.gc_time));
        let evicted = before - slots.len();
        if evicted > 0 {
            tracing::debug!(evicted = evicted, remaining = slots.len(), "Evicted unused cache entries");
        }
    }

    /// Records the outcome of request `seq` for `key`
    fn complete(
        &self,
        key: &QueryKey,
        seq: u64,
        value: Result<serde_json::Value, RemoteFetchError>,
    ) -> Result<CacheEntry, RemoteFetchError> {
        let fetched_at = self.clock.now();
        let mut slots = self.slots.lock();
        let slot = slots.entry(key.clone()).or_default();

        if slot.flight.as_ref().is_some_and(|f| f.seq == seq) {
            slot.flight = None;
        }

        let value = match value {
            Ok(value) => value,
            Err(e) => {
                if slot.entry.is_some() {
                    tracing::warn!(key = %key, error = %e, "Revalidation failed, keeping previous value");
                }
                return Err(e);
            }
        };

        let entry = CacheEntry {
            key: key.clone(),
            value: Arc::new(value),
            fetched_at,
        };

        if seq >= slot.entry_seq {
            slot.entry = Some(entry.clone());
            slot.entry_seq = seq;
            slot.invalidated = false;
            tracing::debug!(key = %key, seq = seq, "Cached response");
        } else {
            tracing::debug!(
                key = %key,
                seq = seq,
                current = slot.entry_seq,
                "Discarding superseded response"
            );
        }

        Ok(entry)
    }
}

enum Plan {
    Ready(CacheEntry, bool),
    Wait(Flight),
}

/// In-process query cache
///
/// - one shared request per key while it is in flight
/// - entries older than their window are served stale while a single
///   background request refreshes them
/// - only the most recently issued request for a key may replace its entry
///
/// - idle entries are evicted once they have been expired for the gc time
///
/// Values are held as JSON and decoded per read, the same way they would be
/// in an external cache.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl QueryCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_gc_time(clock, DEFAULT_GC_TIME)
    }

    pub fn with_gc_time(clock: Arc<dyn Clock>, gc_time: Duration) -> Self {
        let now = clock.now();
        Self {
            inner: Arc::new(Inner {
                slots: Mutex::new(HashMap::new()),
                clock,
                gc_time,
                last_sweep: Mutex::new(now),
            }),
        }
    }

    /// Returns the cached value for `key`, fetching it when missing
    ///
    /// A stale entry is returned immediately with `is_stale` set, and a
    /// refresh is started in the background unless one is already running.
    pub async fn fetch<T, F, Fut>(
        &self,
        key: QueryKey,
        window: Duration,
        fetcher: F,
    ) -> Result<Cached<T>, RemoteFetchError>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, RemoteFetchError>> + Send + 'static,
    {
        let now = self.inner.clock.now();

        let plan = {
            let mut slots = self.inner.slots.lock();
            self.inner.sweep(&mut slots, now);
            let slot = slots.entry(key.clone()).or_default();
            slot.window = window;

            match slot.entry.clone() {
                Some(entry) => {
                    let stale = slot.invalidated || is_stale(&entry, now, window);
                    if !stale {
                        tracing::debug!(key = %key, "Cache hit");
                    } else if slot.flight.is_none() {
                        tracing::debug!(key = %key, "Serving stale entry, revalidating");
                        let flight = self.start_flight(&key, slot, fetcher);
                        tokio::spawn(async move {
                            let _ = flight.await;
                        });
                    }
                    Plan::Ready(entry, stale)
                }
                None => match &slot.flight {
                    Some(in_flight) => {
                        tracing::debug!(key = %key, "Joining in-flight request");
                        Plan::Wait(in_flight.future.clone())
                    }
                    None => {
                        tracing::debug!(key = %key, "Cache miss");
                        Plan::Wait(self.start_flight(&key, slot, fetcher))
                    }
                },
            }
        };

        match plan {
            Plan::Ready(entry, stale) => decode(&entry, stale),
            Plan::Wait(flight) => decode(&flight.await?, false),
        }
    }

    /// Issues a new request for `key` regardless of what is cached, superseding
    /// any request already in flight
    pub async fn refetch<T, F, Fut>(
        &self,
        key: QueryKey,
        fetcher: F,
    ) -> Result<Cached<T>, RemoteFetchError>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, RemoteFetchError>> + Send + 'static,
    {
        let flight = {
            let mut slots = self.inner.slots.lock();
            let slot = slots.entry(key.clone()).or_default();
            self.start_flight(&key, slot, fetcher)
        };
        decode(&flight.await?, false)
    }

    /// Decoded entry for `key`, without fetching
    pub fn peek<T: DeserializeOwned>(&self, key: &QueryKey, window: Duration) -> Option<Cached<T>> {
        let now = self.inner.clock.now();
        let slots = self.inner.slots.lock();
        let slot = slots.get(key)?;
        let entry = slot.entry.as_ref()?;
        let stale = slot.invalidated || is_stale(entry, now, window);
        decode(entry, stale).ok()
    }

    /// Marks the entry for `key` stale so the next read revalidates it
    pub fn invalidate(&self, key: &QueryKey) {
        if let Some(slot) = self.inner.slots.lock().get_mut(key) {
            slot.invalidated = true;
        }
    }

    /// Drops every stored entry
    ///
    /// Slots with a request in flight are kept so that request can still
    /// complete into them.
    pub fn clear(&self) {
        let mut slots = self.inner.slots.lock();
        slots.retain(|_, slot| slot.flight.is_some());
        slots.values_mut().for_each(|slot| slot.entry = None);
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.inner
            .slots
            .lock()
            .values()
            .filter(|slot| slot.entry.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.inner.slots.lock().len()
    }

    fn start_flight<T, F, Fut>(&self, key: &QueryKey, slot: &mut Slot, fetcher: F) -> Flight
    where
        T: Serialize + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, RemoteFetchError>> + Send + 'static,
    {
        slot.issued += 1;
        let seq = slot.issued;
        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        let flight_key = key.clone();

        let future = async move {
            let value = fetcher().await.and_then(|value| {
                serde_json::to_value(&value).map_err(|e| {
                    RemoteFetchError::new(flight_key.operation(), e.to_string())
                })
            });

            match inner.upgrade() {
                Some(inner) => inner.complete(&flight_key, seq, value),
                None => value.map(|value| CacheEntry {
                    key: flight_key,
                    value: Arc::new(value),
                    fetched_at: Utc::now(),
                }),
            }
        }
        .boxed()
        .shared();

        slot.flight = Some(InFlight {
            seq,
            future: future.clone(),
        });
        future
    }
}

fn decode<T: DeserializeOwned>(entry: &CacheEntry, stale: bool) -> Result<Cached<T>, RemoteFetchError> {
    let value = T::deserialize(entry.value.as_ref()).map_err(|e| {
        RemoteFetchError::new(
            entry.key.operation(),
            format!("Cache deserialization error: {}", e),
        )
    })?;

    Ok(Cached {
        value,
        fetched_at: entry.fetched_at,
        is_stale: stale,
    })
}
