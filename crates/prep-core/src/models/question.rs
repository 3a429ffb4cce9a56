//! Question model

use serde::{Deserialize, Serialize};

use super::new_record_id;

/// Whether a question is behavioral or technical
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    /// STAR-style behavioral question
    Behavioral,
    /// Coding / system design / trivia question
    Technical,
}

impl QuestionKind {
    /// Stable string form used for storage indexes
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Behavioral => "behavioral",
            Self::Technical => "technical",
        }
    }
}

/// One prepared answer for a question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerVariation {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub is_primary: bool,
}

impl AnswerVariation {
    /// Create a new answer variation with a fresh id
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: new_record_id(),
            content: content.into(),
            key_points: Vec::new(),
            is_primary: false,
        }
    }
}

/// An interview question and its prepared answers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Unique identifier
    pub id: String,
    /// Behavioral or technical
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    /// Company this question was asked at, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    /// Question text
    pub question: String,
    #[serde(default)]
    pub answer_variations: Vec<AnswerVariation>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub practice_count: u32,
    /// Last practice timestamp (Unix ms)
    #[serde(default)]
    pub last_practiced: Option<i64>,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Technical subtype (coding, system-design, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Code snippet attached to a technical question, kept as opaque JSON
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_snippet: Option<serde_json::Value>,
}

impl Question {
    /// Create a new question with a fresh id
    #[must_use]
    pub fn new(kind: QuestionKind, question: impl Into<String>) -> Self {
        Self {
            id: new_record_id(),
            kind,
            company: None,
            question: question.into(),
            answer_variations: Vec::new(),
            is_favorite: false,
            practice_count: 0,
            last_practiced: None,
            created_at: crate::util::unix_millis_now(),
            subtype: None,
            difficulty: None,
            tags: Vec::new(),
            code_snippet: None,
        }
    }

    /// Set the company this question belongs to
    #[must_use]
    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    /// Record one practice session at `now` (Unix ms)
    pub fn record_practice(&mut self, now: i64) {
        self.practice_count = self.practice_count.saturating_add(1);
        self.last_practiced = Some(now);
    }

    /// The primary answer, falling back to the first one
    pub fn primary_answer(&self) -> Option<&AnswerVariation> {
        self.answer_variations
            .iter()
            .find(|answer| answer.is_primary)
            .or_else(|| self.answer_variations.first())
    }
}
