pub mod cache;
pub mod redis;
pub mod storage;
pub mod writer;

pub use cache::{is_stale, CacheEntry, Cached, QueryCache, QueryKey};
pub use self::redis::{create_redis_client, RedisStorage};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use writer::{PersistenceHandle, PersistenceWriter};

use std::sync::Arc;

use crate::config::{Config, StorageBackend};

/// Opens the storage backend selected in `config`
pub async fn open_storage(config: &Config) -> anyhow::Result<Arc<dyn Storage>> {
    let storage: Arc<dyn Storage> = match config.storage_backend {
        StorageBackend::Memory => Arc::new(MemoryStorage::new()),
        StorageBackend::File => Arc::new(FileStorage::open(&config.data_dir).await?),
        StorageBackend::Redis => {
            Arc::new(RedisStorage::new(create_redis_client(&config.redis_url)?))
        }
    };

    tracing::info!(backend = storage.name(), "Collection storage opened");
    Ok(storage)
}
