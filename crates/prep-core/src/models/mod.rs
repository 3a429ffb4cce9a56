//! Data models for preptrack

mod bookmark;
mod company_note;
mod interview;
mod question;
mod sync_queue;

pub use bookmark::{Bookmark, BookmarkStatus};
pub use company_note::CompanyNote;
pub use interview::{Interview, InterviewStatus};
pub use question::{AnswerVariation, Question, QuestionKind};
pub use sync_queue::{StoreName, SyncOp, SyncQueueItem};

/// Generate a fresh record id (UUID v7, time-sortable)
#[must_use]
pub fn new_record_id() -> String {
    uuid::Uuid::now_v7().to_string()
}
