//! Durable FIFO of mutations waiting for the remote

use std::sync::Arc;

use crate::error::Result;
use crate::models::SyncQueueItem;
use crate::services::LocalStore;

/// Thin handle over the store's persisted queue
#[derive(Clone)]
pub struct SyncQueue {
    store: Arc<dyn LocalStore>,
}

impl SyncQueue {
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }

    /// Append an item; deletes without an entity id are dropped
    pub async fn enqueue(&self, item: &SyncQueueItem) -> Result<bool> {
        if !item.is_replayable() {
            tracing::debug!(store = %item.store, "Dropping delete without entity id");
            return Ok(false);
        }
        self.store.enqueue(item).await?;
        Ok(true)
    }

    /// Every queued item in enqueue order, without removing anything
    pub async fn snapshot(&self) -> Result<Vec<SyncQueueItem>> {
        self.store.queue_items().await
    }

    pub async fn clear(&self) -> Result<()> {
        self.store.clear_queue().await
    }

    /// Snapshot then clear, in that order
    pub async fn drain(&self) -> Result<Vec<SyncQueueItem>> {
        self.store.drain_queue().await
    }
}
