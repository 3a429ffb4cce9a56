//! Client sync configuration.
//!
//! Read from the environment once at startup. Sync stays off unless a remote
//! base URL is configured.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::sync::DEFAULT_RETRY_INTERVAL;
use crate::util::{is_http_url, normalize_text_option};

pub const API_BASE_URL_VAR: &str = "PREP_API_BASE_URL";
pub const RETRY_SECS_VAR: &str = "PREP_SYNC_RETRY_SECS";
pub const TIMEOUT_SECS_VAR: &str = "PREP_SYNC_TIMEOUT_SECS";
pub const TEST_MODE_VAR: &str = "PREP_TEST_MODE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for the sync bridge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    /// Remote API root, e.g. `http://localhost:3001/api`
    pub api_base_url: Option<String>,
    pub retry_interval: Duration,
    /// Per-request timeout; `None` keeps the transport default
    pub request_timeout: Option<Duration>,
    /// Skip sync setup entirely
    pub test_mode: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            api_base_url: None,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            request_timeout: None,
            test_mode: false,
        }
    }
}

impl SyncSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_base_url = normalize_text_option(lookup(API_BASE_URL_VAR))
            .map(|url| url.trim_end_matches('/').to_string());
        if let Some(url) = api_base_url.as_deref() {
            if !is_http_url(url) {
                return Err(ConfigError::Invalid(format!(
                    "{API_BASE_URL_VAR} must start with http:// or https://"
                )));
            }
        }

        let retry_interval = match parse_secs(&lookup, RETRY_SECS_VAR)? {
            Some(0) => {
                return Err(ConfigError::Invalid(format!(
                    "{RETRY_SECS_VAR} must be at least 1"
                )))
            }
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_RETRY_INTERVAL,
        };
        let request_timeout = parse_secs(&lookup, TIMEOUT_SECS_VAR)?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        let test_mode = normalize_text_option(lookup(TEST_MODE_VAR))
            .is_some_and(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"));

        Ok(Self {
            api_base_url,
            retry_interval,
            request_timeout,
            test_mode,
        })
    }

    /// Whether a remote is configured at all
    pub const fn is_enabled(&self) -> bool {
        self.api_base_url.is_some()
    }
}

fn parse_secs(
    lookup: impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<u64>, ConfigError> {
    normalize_text_option(lookup(name))
        .map(|value| {
            value
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid(format!("{name} must be a whole number of seconds")))
        })
        .transpose()
}
