//! Sync queue repository

use libsql::params::Params;
use libsql::{Connection, Row, Value};

use crate::error::Result;
use crate::models::{SyncOp, SyncQueueItem};

/// Persistent FIFO of pending sync mutations
pub struct LibSqlQueueRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlQueueRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Append an item to the end of the queue
    pub async fn push(&self, item: &SyncQueueItem) -> Result<()> {
        let data = match &item.data {
            Some(value) => Value::Text(serde_json::to_string(value)?),
            None => Value::Null,
        };
        let entity_id = item
            .entity_id
            .as_ref()
            .map_or(Value::Null, |id| Value::Text(id.clone()));

        self.conn
            .execute(
                "INSERT INTO sync_queue (op, store, data, entity_id, timestamp) VALUES (?, ?, ?, ?, ?)",
                Params::Positional(vec![
                    Value::Text(item.op.as_str().to_string()),
                    Value::Text(item.store.clone()),
                    data,
                    entity_id,
                    Value::Integer(item.timestamp),
                ]),
            )
            .await?;
        Ok(())
    }

    /// All queued items in enqueue order
    ///
    /// Rows that can no longer be decoded can never be replayed; they are
    /// logged once and deleted so the table matches what callers see.
    pub async fn list(&self) -> Result<Vec<SyncQueueItem>> {
        let mut rows = self
            .conn
            .query(
                "SELECT seq, op, store, data, entity_id, timestamp FROM sync_queue ORDER BY seq ASC",
                (),
            )
            .await?;

        let mut items = Vec::new();
        let mut undecodable = Vec::new();
        while let Some(row) = rows.next().await? {
            let seq: i64 = row.get(0)?;
            match Self::parse_item(&row) {
                Ok(item) => items.push(item),
                Err(error) => {
                    tracing::warn!(seq, "Purging undecodable sync queue row: {error}");
                    undecodable.push(seq);
                }
            }
        }
        drop(rows);

        for seq in undecodable {
            self.conn
                .execute(
                    "DELETE FROM sync_queue WHERE seq = ?",
                    Params::Positional(vec![Value::Integer(seq)]),
                )
                .await?;
        }
        Ok(items)
    }

    /// Remove every queued item
    pub async fn clear(&self) -> Result<u64> {
        let removed = self.conn.execute("DELETE FROM sync_queue", ()).await?;
        Ok(removed)
    }

    /// Number of queued items
    pub async fn count(&self) -> Result<u64> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM sync_queue", ())
            .await?;
        let count = match rows.next().await? {
            Some(row) => row.get::<i64>(0)?,
            None => 0,
        };
        Ok(u64::try_from(count).unwrap_or_default())
    }

    fn parse_item(row: &Row) -> Result<SyncQueueItem> {
        let op: String = row.get(1)?;
        let op = op
            .parse::<SyncOp>()
            .map_err(crate::error::Error::InvalidInput)?;
        let data = match optional_text(row, 3)? {
            Some(raw) => Some(serde_json::from_str(&raw)?),
            None => None,
        };

        Ok(SyncQueueItem {
            op,
            store: row.get(2)?,
            data,
            entity_id: optional_text(row, 4)?,
            timestamp: row.get(5)?,
        })
    }
}

fn optional_text(row: &Row, idx: i32) -> Result<Option<String>> {
    match row.get_value(idx)? {
        Value::Text(text) => Ok(Some(text)),
        _ => Ok(None),
    }
}
