//! Typed local mutations

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::models::{
    Bookmark, CompanyNote, Interview, Question, StoreName, SyncOp, SyncQueueItem,
};

/// A change to one record of type `T`
#[derive(Debug, Clone, PartialEq)]
pub enum Change<T> {
    Create(T),
    Update(T),
    /// Removal by record key
    Delete(String),
}

impl<T> Change<T> {
    pub const fn op(&self) -> SyncOp {
        match self {
            Self::Create(_) => SyncOp::Create,
            Self::Update(_) => SyncOp::Update,
            Self::Delete(_) => SyncOp::Delete,
        }
    }

    /// Snapshot carried by creates and updates
    pub const fn record(&self) -> Option<&T> {
        match self {
            Self::Create(record) | Self::Update(record) => Some(record),
            Self::Delete(_) => None,
        }
    }
}

impl<T: DeserializeOwned> Change<T> {
    fn decode(op: SyncOp, data: Option<&Value>, entity_id: Option<&str>) -> Option<Self> {
        match op {
            SyncOp::Delete => entity_id.map(|id| Self::Delete(id.to_string())),
            SyncOp::Create | SyncOp::Update => {
                let record = T::deserialize(data?).ok()?;
                Some(if op == SyncOp::Create {
                    Self::Create(record)
                } else {
                    Self::Update(record)
                })
            }
        }
    }
}

/// A local write, tagged with the store it belongs to
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Question(Change<Question>),
    Bookmark(Change<Bookmark>),
    Interview(Change<Interview>),
    CompanyNote(Change<CompanyNote>),
}

impl Mutation {
    pub const fn op(&self) -> SyncOp {
        match self {
            Self::Question(change) => change.op(),
            Self::Bookmark(change) => change.op(),
            Self::Interview(change) => change.op(),
            Self::CompanyNote(change) => change.op(),
        }
    }

    pub const fn store(&self) -> StoreName {
        match self {
            Self::Question(_) => StoreName::Questions,
            Self::Bookmark(_) => StoreName::Bookmarks,
            Self::Interview(_) => StoreName::Interviews,
            Self::CompanyNote(_) => StoreName::CompanyNotes,
        }
    }

    /// Rebuild a mutation from its untyped parts
    ///
    /// Returns `None` for unknown stores, deletes without an id, and creates or
    /// updates whose snapshot is missing or doesn't decode.
    pub fn from_parts(
        op: SyncOp,
        store: &str,
        data: Option<&Value>,
        entity_id: Option<&str>,
    ) -> Option<Self> {
        let mutation = match StoreName::parse(store)? {
            StoreName::Questions => Self::Question(Change::decode(op, data, entity_id)?),
            StoreName::Bookmarks => Self::Bookmark(Change::decode(op, data, entity_id)?),
            StoreName::Interviews => Self::Interview(Change::decode(op, data, entity_id)?),
            StoreName::CompanyNotes => Self::CompanyNote(Change::decode(op, data, entity_id)?),
        };
        Some(mutation)
    }

    pub fn from_queue_item(item: &SyncQueueItem) -> Option<Self> {
        Self::from_parts(
            item.op,
            &item.store,
            item.data.as_ref(),
            item.entity_id.as_deref(),
        )
    }

    /// Persistable form; `data` only for creates/updates, `entity_id` only for deletes
    pub fn to_queue_item(&self) -> SyncQueueItem {
        let (data, entity_id) = match self {
            Self::Question(change) => split(change),
            Self::Bookmark(change) => split(change),
            Self::Interview(change) => split(change),
            Self::CompanyNote(change) => split(change),
        };
        SyncQueueItem::new(self.op(), self.store().as_str(), data, entity_id)
    }
}

fn split<T: Serialize>(change: &Change<T>) -> (Option<Value>, Option<String>) {
    match change {
        Change::Create(record) | Change::Update(record) => {
            (serde_json::to_value(record).ok(), None)
        }
        Change::Delete(id) => (None, Some(id.clone())),
    }
}
