//! Pending sync mutation model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of local mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncOp {
    Create,
    Update,
    Delete,
}

impl SyncOp {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for SyncOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(format!("unknown sync op: {other}")),
        }
    }
}

/// Entity tables that participate in sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StoreName {
    #[serde(rename = "questions")]
    Questions,
    #[serde(rename = "bookmarks")]
    Bookmarks,
    #[serde(rename = "interviews")]
    Interviews,
    #[serde(rename = "companyNotes")]
    CompanyNotes,
}

impl StoreName {
    pub const ALL: [Self; 4] = [
        Self::Questions,
        Self::Bookmarks,
        Self::Interviews,
        Self::CompanyNotes,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Questions => "questions",
            Self::Bookmarks => "bookmarks",
            Self::Interviews => "interviews",
            Self::CompanyNotes => "companyNotes",
        }
    }

    /// Parse a persisted store name; unknown names yield `None`
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|store| store.as_str() == name)
    }
}

impl fmt::Display for StoreName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mutation waiting to be replayed against the remote
///
/// `store` stays a plain string so rows written by other builds survive a
/// reload; the dispatcher discards names it doesn't know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncQueueItem {
    pub op: SyncOp,
    pub store: String,
    /// Entity snapshot, absent for deletes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Required for deletes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    /// Enqueue time (Unix ms)
    pub timestamp: i64,
}

impl SyncQueueItem {
    /// Build an item stamped with the current time
    #[must_use]
    pub fn new(
        op: SyncOp,
        store: impl Into<String>,
        data: Option<serde_json::Value>,
        entity_id: Option<String>,
    ) -> Self {
        Self {
            op,
            store: store.into(),
            data,
            entity_id,
            timestamp: crate::util::unix_millis_now(),
        }
    }

    /// A delete without an entity id can never succeed and must not be retried
    pub const fn is_replayable(&self) -> bool {
        !matches!(self.op, SyncOp::Delete) || self.entity_id.is_some()
    }
}
