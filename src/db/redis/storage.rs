use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use redis::Client;
use tokio::sync::OnceCell;

use crate::db::storage::Storage;
use crate::error::StorageError;

const KEY_PREFIX: &str = "cinetrack";

/// Creates a Redis client for the collection storage
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Collection storage kept in Redis under `cinetrack:<key>`
///
/// Connects on first use and then shares one reconnecting connection
/// between all operations.
#[derive(Clone)]
pub struct RedisStorage {
    redis_client: Client,
    conn: OnceCell<ConnectionManager>,
}

impl RedisStorage {
    pub fn new(redis_client: Client) -> Self {
        Self {
            redis_client,
            conn: OnceCell::new(),
        }
    }

    async fn connection(&self) -> Result<ConnectionManager, StorageError> {
        let conn = self
            .conn
            .get_or_try_init(|| ConnectionManager::new(self.redis_client.clone()))
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Redis connection failed");
                e
            })?;
        Ok(conn.clone())
    }

    fn namespaced(key: &str) -> String {
        format!("{}:{}", KEY_PREFIX, key)
    }
}

#[async_trait::async_trait]
impl Storage for RedisStorage {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(Self::namespaced(key)).await.map_err(|e| {
            tracing::warn!(error = %e, "Redis get failed");
            e
        })?;
        Ok(value)
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut conn = self.connection().await?;
        let _: () = conn.set(Self::namespaced(key), value).await.map_err(|e| {
            tracing::warn!(error = %e, "Redis set failed");
            e
        })?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut conn = self.connection().await?;
        let _: () = conn.del(Self::namespaced(key)).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
