//! Bookmark model

use serde::{Deserialize, Serialize};

use super::new_record_id;

/// Reading progress of a bookmarked resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookmarkStatus {
    #[default]
    Unread,
    InProgress,
    Completed,
}

impl BookmarkStatus {
    /// Stable string form used for storage indexes
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unread => "unread",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        }
    }
}

/// A saved learning resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: String,
    pub title: String,
    pub url: String,
    /// Free-form resource type (blog, video, course, docs, ...)
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    #[serde(default)]
    pub status: BookmarkStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
}

impl Bookmark {
    /// Create a new unread bookmark with a fresh id
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        resource_type: impl Into<String>,
    ) -> Self {
        Self {
            id: new_record_id(),
            title: title.into(),
            url: url.into(),
            resource_type: resource_type.into(),
            category: None,
            collection: None,
            status: BookmarkStatus::Unread,
            notes: None,
            created_at: crate::util::unix_millis_now(),
        }
    }
}
