//! Interview model

use serde::{Deserialize, Serialize};

use super::new_record_id;

const DEFAULT_DURATION_MINUTES: u32 = 60;

const fn default_duration() -> u32 {
    DEFAULT_DURATION_MINUTES
}

/// Lifecycle of a scheduled interview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterviewStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
}

impl InterviewStatus {
    /// Stable string form used for storage indexes
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// A scheduled interview round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interview {
    pub id: String,
    pub company: String,
    /// Scheduled start (Unix ms)
    pub date_time: i64,
    /// Length in minutes
    #[serde(default = "default_duration")]
    pub duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Free-form interview type (phone-screen, onsite, ...)
    pub interview_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<String>,
    #[serde(default)]
    pub status: InterviewStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub linked_question_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    /// UID of the calendar event this interview was imported from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ical_uid: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Interview {
    /// Create a new scheduled interview with a fresh id
    #[must_use]
    pub fn new(company: impl Into<String>, date_time: i64, interview_type: impl Into<String>) -> Self {
        let now = crate::util::unix_millis_now();
        Self {
            id: new_record_id(),
            company: company.into(),
            date_time,
            duration: DEFAULT_DURATION_MINUTES,
            role: None,
            interview_type: interview_type.into(),
            round: None,
            status: InterviewStatus::Scheduled,
            notes: None,
            linked_question_ids: Vec::new(),
            location: None,
            contact_name: None,
            contact_email: None,
            ical_uid: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the interview is still scheduled and starts at or after `now`
    pub fn is_upcoming(&self, now: i64) -> bool {
        self.status == InterviewStatus::Scheduled && self.date_time >= now
    }

    /// Bump `updated_at` to the current time
    pub fn touch(&mut self) {
        self.updated_at = crate::util::unix_millis_now();
    }
}
