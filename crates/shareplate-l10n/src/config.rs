//! Configuration for the localization engine

use std::time::Duration;

use crate::locale::LocaleCode;

/// Configuration for [`SyncCoordinator`](crate::coordinator::SyncCoordinator)
/// and [`RemoteSyncClient`](crate::client::RemoteSyncClient)
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Base URL of the translation service (e.g. `https://api.shareplate.club/functions/v1`)
    pub base_url: String,
    /// Bearer token for the authenticated transport
    pub auth_token: String,
    /// App version reported with missing-key telemetry
    pub app_version: String,
    /// Locale activated at startup when no preference is stored
    pub default_locale: LocaleCode,
    /// Request timeout for every network fetch
    pub request_timeout: Duration,
    /// Maximum retry attempts for a retryable error
    pub max_retries: usize,
    /// Base delay for exponential backoff, in milliseconds
    pub base_backoff_ms: u64,
    /// Cap on any single backoff delay
    pub max_backoff: Duration,
    /// Outbound requests per second (client-side limit)
    pub rate_limit_per_sec: u32,
    /// Cached data older than this triggers a refresh at startup
    pub staleness_threshold: Duration,
    /// Interval between periodic background refreshes
    pub refresh_interval: Duration,
    /// Missing keys reported once this many accumulate
    pub missing_key_batch_size: usize,
    /// Missing keys reported at least this often while any are pending
    pub missing_key_flush_interval: Duration,
    /// Capacity of the dynamic content translation memo
    pub content_cache_capacity: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.shareplate.club/functions/v1".to_string(),
            auth_token: String::new(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            default_locale: LocaleCode::English,
            request_timeout: Duration::from_secs(15),
            max_retries: 3,
            base_backoff_ms: 100,
            max_backoff: Duration::from_secs(10),
            rate_limit_per_sec: 10,
            staleness_threshold: Duration::from_secs(6 * 3600),
            refresh_interval: Duration::from_secs(3600),
            missing_key_batch_size: 10,
            missing_key_flush_interval: Duration::from_secs(30),
            content_cache_capacity: 500,
        }
    }
}

impl SyncConfig {
    /// Create a configuration with the minimum required parameters
    pub fn new(base_url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token: auth_token.into(),
            ..Default::default()
        }
    }

    /// Set the default locale
    pub fn with_default_locale(mut self, locale: LocaleCode) -> Self {
        self.default_locale = locale;
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the maximum retry attempts
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the backoff window (base delay in ms, cap)
    pub fn with_backoff(mut self, base_ms: u64, max: Duration) -> Self {
        self.base_backoff_ms = base_ms;
        self.max_backoff = max;
        self
    }

    /// Set the staleness threshold
    pub fn with_staleness_threshold(mut self, threshold: Duration) -> Self {
        self.staleness_threshold = threshold;
        self
    }

    /// Set the periodic refresh interval
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chain() {
        let config = SyncConfig::new("https://example.test", "token")
            .with_default_locale(LocaleCode::Russian)
            .with_max_retries(5)
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.default_locale, LocaleCode::Russian);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.base_url, "https://example.test");
    }
}
