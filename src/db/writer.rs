use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::db::storage::Storage;
use crate::error::StorageError;

enum WriteMessage {
    Write { key: String, value: String },
    Remove { key: String },
    Flush(oneshot::Sender<()>),
}

/// Fire-and-forget writer in front of a [`Storage`] backend
///
/// Writes are queued on a channel and applied by one background task in the
/// order they were queued, so the last queued value for a key is the one
/// that ends up stored.
#[derive(Clone)]
pub struct PersistenceWriter {
    write_tx: mpsc::UnboundedSender<WriteMessage>,
}

/// Handle for gracefully shutting down the persistence writer
pub struct PersistenceHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl PersistenceHandle {
    /// Applies every queued write, then stops the writer task
    ///
    /// Dropping the handle instead leaves the writer running until every
    /// [`PersistenceWriter`] clone is gone.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Persistence writer task panicked");
        }
        tracing::info!("Persistence writer stopped");
    }
}

impl PersistenceWriter {
    /// Spawns the background task that owns `storage` writes
    pub fn spawn(storage: Arc<dyn Storage>) -> (Self, PersistenceHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let task = tokio::spawn(async move {
            Self::writer_task(storage, write_rx, shutdown_rx).await;
        });

        (Self { write_tx }, PersistenceHandle { shutdown_tx, task })
    }

    /// Queues `value` to be stored under `key`; never blocks
    pub fn persist(&self, key: &str, value: String) {
        let msg = WriteMessage::Write {
            key: key.to_string(),
            value,
        };

        if self.write_tx.send(msg).is_err() {
            tracing::error!(key = %key, "Persistence writer is gone, dropping write");
        }
    }

    /// Queues deletion of `key`, ordered with the writes around it
    pub fn remove(&self, key: &str) {
        let msg = WriteMessage::Remove {
            key: key.to_string(),
        };

        if self.write_tx.send(msg).is_err() {
            tracing::error!(key = %key, "Persistence writer is gone, dropping removal");
        }
    }

    /// Waits until every write queued before this call has been applied
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.write_tx.send(WriteMessage::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
    }

    async fn writer_task(
        storage: Arc<dyn Storage>,
        mut write_rx: mpsc::UnboundedReceiver<WriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!(backend = storage.name(), "Persistence writer started");

        loop {
            tokio::select! {
                biased;

                Some(msg) = write_rx.recv() => {
                    Self::handle(storage.as_ref(), msg).await;
                }
                Some(()) = shutdown_rx.recv() => {
                    let mut flushed = 0;
                    while let Ok(msg) = write_rx.try_recv() {
                        Self::handle(storage.as_ref(), msg).await;
                        flushed += 1;
                    }
                    tracing::info!(flushed = flushed, "Persistence writer shutting down");
                    break;
                }
                else => break,
            }
        }
    }

    async fn handle(storage: &dyn Storage, msg: WriteMessage) {
        match msg {
            WriteMessage::Write { key, value } => {
                if let Err(e) = Self::write(storage, &key, &value).await {
                    tracing::error!(key = %key, error = %e, "Failed to persist collection");
                }
            }
            WriteMessage::Remove { key } => match storage.remove(&key).await {
                Ok(()) => tracing::debug!(key = %key, "Removed persisted collection"),
                Err(e) => tracing::error!(key = %key, error = %e, "Failed to remove persisted collection"),
            },
            WriteMessage::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }

    async fn write(storage: &dyn Storage, key: &str, value: &str) -> Result<(), StorageError> {
        storage.write(key, value).await?;
        tracing::debug!(key = %key, bytes = value.len(), "Persisted collection");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::storage::MemoryStorage;

    #[tokio::test]
    async fn test_writes_apply_in_order() {
        let storage = Arc::new(MemoryStorage::new());
        let (writer, _handle) = PersistenceWriter::spawn(storage.clone());

        writer.persist("k", "one".to_string());
        writer.persist("k", "two".to_string());
        writer.persist("k", "three".to_string());
        writer.flush().await;

        assert_eq!(storage.read("k").await.unwrap().as_deref(), Some("three"));
    }

    #[tokio::test]
    async fn test_remove_is_ordered_with_writes() {
        let storage = Arc::new(MemoryStorage::new());
        let (writer, _handle) = PersistenceWriter::spawn(storage.clone());

        writer.persist("k", "one".to_string());
        writer.remove("k");
        writer.flush().await;
        assert_eq!(storage.read("k").await.unwrap(), None);

        writer.remove("k");
        writer.persist("k", "two".to_string());
        writer.flush().await;
        assert_eq!(storage.read("k").await.unwrap().as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn test_shutdown_flushes_pending_writes() {
        let storage = Arc::new(MemoryStorage::new());
        let (writer, handle) = PersistenceWriter::spawn(storage.clone());

        writer.persist("a", "1".to_string());
        writer.persist("b", "2".to_string());
        handle.shutdown().await;

        assert_eq!(storage.read("a").await.unwrap().as_deref(), Some("1"));
        assert_eq!(storage.read("b").await.unwrap().as_deref(), Some("2"));

        // Writes after shutdown are dropped, not panicking
        writer.persist("c", "3".to_string());
        writer.flush().await;
        assert_eq!(storage.read("c").await.unwrap(), None);
    }
}
