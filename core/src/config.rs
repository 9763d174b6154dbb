//! Client configuration: where the REST API lives and how long to wait for it.

use std::time::Duration;

/// Environment variable holding the REST API base address.
pub const API_URL_VAR: &str = "EMS_API_URL";

/// Base address used when `EMS_API_URL` is unset or blank.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

/// Per-request timeout. Fixed; there is no override.
pub const REQUEST_TIMEOUT: Duration = Duration::from_millis(10_000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: REQUEST_TIMEOUT,
        }
    }

    /// Read the base address from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like `from_env`, but with the variable lookup supplied by the caller.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        match lookup(API_URL_VAR) {
            Some(url) if !url.trim().is_empty() => Self::new(url.trim()),
            _ => Self::new(DEFAULT_BASE_URL),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
