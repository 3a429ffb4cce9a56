//! Company note model

use serde::{Deserialize, Serialize};

/// Free-form notes about a company, keyed by company name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyNote {
    pub company: String,
    pub content: String,
    /// Last edit timestamp (Unix ms)
    pub updated_at: i64,
}

impl CompanyNote {
    /// Create a note stamped with the current time
    #[must_use]
    pub fn new(company: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            content: content.into(),
            updated_at: crate::util::unix_millis_now(),
        }
    }
}
