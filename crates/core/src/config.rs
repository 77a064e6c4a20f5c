//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Request handling never reads environment variables.

use crate::{RefinerError, RefinerResult};
use std::time::Duration;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    reference_base_url: String,
    lookup_timeout: Option<Duration>,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Arguments
    ///
    /// * `reference_base_url` - Base address of the Reference Lookup Service. Must be an absolute
    ///   `http`/`https` URL; trailing slashes are removed.
    /// * `lookup_timeout` - Optional per-request timeout handed to the HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns `RefinerError::InvalidConfig` if the base URL cannot be parsed or is not HTTP(S).
    pub fn new(reference_base_url: &str, lookup_timeout: Option<Duration>) -> RefinerResult<Self> {
        let trimmed = reference_base_url.trim().trim_end_matches('/');
        let parsed = reqwest::Url::parse(trimmed).map_err(|e| {
            RefinerError::InvalidConfig(format!("reference service URL {trimmed:?}: {e}"))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RefinerError::InvalidConfig(format!(
                "reference service URL must use http or https, got {}",
                parsed.scheme()
            )));
        }

        Ok(Self {
            reference_base_url: trimmed.to_owned(),
            lookup_timeout,
        })
    }

    pub fn reference_base_url(&self) -> &str {
        &self.reference_base_url
    }

    pub fn lookup_timeout(&self) -> Option<Duration> {
        self.lookup_timeout
    }
}

/// Parse the lookup timeout (whole seconds) from an optional string value.
///
/// If `value` is `None` or empty/whitespace, no timeout is applied.
pub fn lookup_timeout_from_env_value(value: Option<String>) -> RefinerResult<Option<Duration>> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    value
        .map(|v| {
            v.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| RefinerError::InvalidConfig(format!("lookup timeout {v:?}: {e}")))
        })
        .transpose()
}
