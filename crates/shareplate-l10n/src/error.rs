//! Error types for localization sync and lookup operations

use std::time::Duration;
use thiserror::Error;

use shareplate_common::ShareError;

/// Errors that can occur in the localization engine
#[derive(Error, Debug)]
pub enum L10nError {
    /// Network failure reaching the translation endpoint
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Response body could not be decoded
    #[error("Failed to parse translation payload: {message}")]
    Parse { message: String },

    /// A sync attempt failed after exhausting every data source
    #[error("Translation sync failed for locale {locale}: {message}")]
    SyncFailed { locale: String, message: String },

    /// The requested locale is not in the supported set
    #[error("Unsupported locale: {0}")]
    UnsupportedLocale(String),

    /// Persisted cache record could not be trusted
    #[error("Cache corrupted for locale {locale}: {message}")]
    CacheCorrupted { locale: String, message: String },

    /// Server asked us to back off (HTTP 429)
    #[error("Rate limited by translation endpoint")]
    RateLimited { retry_after: Option<Duration> },

    /// Server-side failure (5xx)
    #[error("Translation endpoint returned server error: {status}")]
    Server { status: u16 },

    /// Authentication failed (401/403)
    #[error("Unauthorized request to translation endpoint")]
    Unauthorized,

    /// The request exceeded its timeout
    #[error("Translation request timed out")]
    Timeout,
}

/// Result type for localization operations
pub type L10nResult<T> = Result<T, L10nError>;

impl L10nError {
    /// Whether a retry with backoff may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::RateLimited { .. } | Self::Server { .. } | Self::Timeout
        )
    }

    /// Create a network error without a source
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a network error with source
    pub fn network_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Network {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a sync-failed error
    pub fn sync_failed(locale: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::SyncFailed {
            locale: locale.into(),
            message: msg.into(),
        }
    }

    /// Create a cache-corrupted error
    pub fn cache_corrupted(locale: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::CacheCorrupted {
            locale: locale.into(),
            message: msg.into(),
        }
    }

    /// A short stable label for the error class, used in `SyncState::Error`
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network",
            Self::Parse { .. } => "parse",
            Self::SyncFailed { .. } => "sync_failed",
            Self::UnsupportedLocale(_) => "unsupported_locale",
            Self::CacheCorrupted { .. } => "cache_corrupted",
            Self::RateLimited { .. } => "rate_limited",
            Self::Server { .. } => "server",
            Self::Unauthorized => "unauthorized",
            Self::Timeout => "timeout",
        }
    }
}

/// Convert from reqwest::Error, classifying timeouts separately
impl From<reqwest::Error> for L10nError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Parse {
                message: err.to_string(),
            }
        } else {
            Self::network_with_source("Request failed", err)
        }
    }
}

impl From<serde_json::Error> for L10nError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            message: err.to_string(),
        }
    }
}

impl From<L10nError> for ShareError {
    fn from(err: L10nError) -> Self {
        ShareError::localization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classes() {
        assert!(L10nError::network("down").is_retryable());
        assert!(L10nError::RateLimited { retry_after: None }.is_retryable());
        assert!(L10nError::Server { status: 503 }.is_retryable());
        assert!(L10nError::Timeout.is_retryable());
    }

    #[test]
    fn test_non_retryable_classes() {
        assert!(!L10nError::Unauthorized.is_retryable());
        assert!(!L10nError::parse("bad json").is_retryable());
        assert!(!L10nError::UnsupportedLocale("xx".into()).is_retryable());
        assert!(!L10nError::cache_corrupted("en", "truncated").is_retryable());
    }

    #[test]
    fn test_share_error_bridge() {
        let err: ShareError = L10nError::Timeout.into();
        assert!(err.to_string().contains("Localization error"));
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(L10nError::Timeout.kind(), "timeout");
        assert_eq!(L10nError::Server { status: 500 }.kind(), "server");
    }
}
