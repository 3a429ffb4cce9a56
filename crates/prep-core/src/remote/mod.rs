//! Remote mirror client
//!
//! Every remote operation returns `Some(decoded body)` or `None`. `None` is the
//! only failure signal: connection errors, non-2xx statuses and undecodable
//! bodies all collapse into it, and callers treat them all as retryable.

mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{Bookmark, CompanyNote, Interview, Question, StoreName};

pub use http::HttpRemoteClient;

/// Full remote dataset returned by a pull
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PullResponse {
    pub questions: Vec<Question>,
    pub bookmarks: Vec<Bookmark>,
    pub interviews: Vec<Interview>,
    pub notes: Vec<CompanyNote>,
}

/// A record removal carried inside a [`PushBatch`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deletion {
    pub store: StoreName,
    pub id: String,
}

/// Bulk upload; empty kinds are omitted from the wire payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PushBatch {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub questions: Vec<Question>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bookmarks: Vec<Bookmark>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interviews: Vec<Interview>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<CompanyNote>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deletions: Vec<Deletion>,
}

impl PushBatch {
    /// True when there is nothing to send
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
            && self.bookmarks.is_empty()
            && self.interviews.is_empty()
            && self.notes.is_empty()
            && self.deletions.is_empty()
    }

    /// Number of records carried
    pub fn len(&self) -> usize {
        self.questions.len()
            + self.bookmarks.len()
            + self.interviews.len()
            + self.notes.len()
            + self.deletions.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushAck {
    pub success: bool,
}

/// Body returned by record upserts and updates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordAck {
    pub id: String,
}

/// Body returned by record deletes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteAck {
    pub deleted: bool,
}

/// Narrow request/response interface to the remote mirror
///
/// Upserts must be idempotent: a request whose response was lost may be
/// replayed.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    async fn pull(&self) -> Option<PullResponse>;
    async fn push(&self, batch: &PushBatch) -> Option<PushAck>;

    async fn upsert_question(&self, question: &Question) -> Option<RecordAck>;
    async fn update_question(&self, id: &str, question: &Question) -> Option<RecordAck>;
    async fn delete_question(&self, id: &str) -> Option<DeleteAck>;

    async fn upsert_bookmark(&self, bookmark: &Bookmark) -> Option<RecordAck>;
    async fn update_bookmark(&self, id: &str, bookmark: &Bookmark) -> Option<RecordAck>;
    async fn delete_bookmark(&self, id: &str) -> Option<DeleteAck>;

    async fn upsert_interview(&self, interview: &Interview) -> Option<RecordAck>;
    async fn update_interview(&self, id: &str, interview: &Interview) -> Option<RecordAck>;
    async fn delete_interview(&self, id: &str) -> Option<DeleteAck>;

    async fn upsert_note(&self, company: &str, note: &CompanyNote) -> Option<CompanyNote>;
}
