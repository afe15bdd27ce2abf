//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid timeout for {0} (must be 1..=300 seconds)")]
    InvalidTimeout(&'static str),

    #[error("Invalid URL for {0}")]
    InvalidUrl(&'static str),

    #[error("Firestore backend needs either credentials_path or access_token, not both")]
    ConflictingCredentials,

    #[error("Invalid log filter: {0}")]
    InvalidLogFilter(String),
}

pub(crate) const MAX_TIMEOUT_SECS: u64 = 300;

/// Shared timeout check used by every section.
pub(crate) fn check_timeout(field: &'static str, secs: u64) -> Result<(), ValidationError> {
    if secs == 0 || secs > MAX_TIMEOUT_SECS {
        return Err(ValidationError::InvalidTimeout(field));
    }
    Ok(())
}

pub(crate) fn check_http_url(field: &'static str, url: &str) -> Result<(), ValidationError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ValidationError::InvalidUrl(field))
    }
}

/// Blank strings from the environment count as unset.
pub(crate) fn is_set(value: &Option<String>) -> bool {
    value.as_ref().is_some_and(|v| !v.trim().is_empty())
}
