//! Authenticated HTTP transport for the translation service
//!
//! The engine only depends on the [`TranslationTransport`] trait; the
//! reqwest-backed [`HttpTransport`] is the production implementation.
//! Tests inject mocks or scripted fakes.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota};
use reqwest::{header, Client, Response, StatusCode};
use tracing::debug;
use url::Url;

use crate::config::SyncConfig;
use crate::error::{L10nError, L10nResult};
use crate::locale::LocaleCode;
use crate::protocol::{
    FetchResponse, LegacySnapshot, TranslateContentRequest, TranslateContentResponse,
    TranslationsResponse,
};

/// Header distinguishing delta bodies from full snapshots
const DELTA_SYNC_HEADER: &str = "x-delta-sync";

/// Remote source of translation data
///
/// Each method performs exactly one attempt; retry and fallback policy
/// live in [`RemoteSyncClient`](crate::client::RemoteSyncClient).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranslationTransport: Send + Sync {
    /// Conditional fetch against the primary endpoint:
    /// `GET /translations?locale&version` with `If-None-Match`.
    /// Validators are owned so the trait stays object-safe under mocking.
    async fn fetch_translations(
        &self,
        locale: LocaleCode,
        known_version: Option<String>,
        known_tag: Option<String>,
    ) -> L10nResult<FetchResponse>;

    /// Legacy endpoint: `GET /translations/{locale}`.
    async fn fetch_legacy(&self, locale: LocaleCode) -> L10nResult<LegacySnapshot>;

    /// Last-resort direct datastore read, bypassing the edge function.
    async fn fetch_direct(&self, locale: LocaleCode) -> L10nResult<LegacySnapshot>;

    /// Dynamic content translation: `POST /translations/content`.
    async fn translate_content(
        &self,
        request: &TranslateContentRequest,
    ) -> L10nResult<TranslateContentResponse>;
}

/// reqwest-backed transport with bearer auth, a fixed request timeout
/// and a client-side rate limiter
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    auth_token: String,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl HttpTransport {
    pub fn new(config: &SyncConfig) -> L10nResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| L10nError::network_with_source("Failed to create HTTP client", e))?;

        // A trailing slash keeps Url::join from dropping the last path segment
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| L10nError::network_with_source("Invalid base URL", e))?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.rate_limit_per_sec.max(1)).expect("nonzero rate limit"),
        );

        Ok(Self {
            client,
            base_url,
            auth_token: config.auth_token.clone(),
            rate_limiter: Arc::new(DefaultDirectRateLimiter::direct(quota)),
        })
    }

    fn endpoint(&self, path: &str) -> L10nResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| L10nError::network_with_source("Invalid endpoint path", e))
    }

    /// Map a non-success status to its error class
    fn classify_status(locale: LocaleCode, response: &Response) -> L10nError {
        let status = response.status();
        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get(header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .map(Duration::from_secs);
                L10nError::RateLimited { retry_after }
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => L10nError::Unauthorized,
            StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => {
                L10nError::UnsupportedLocale(locale.code().to_string())
            }
            s if s.is_server_error() => L10nError::Server {
                status: s.as_u16(),
            },
            s => L10nError::network(format!("unexpected status {s}")),
        }
    }

    async fn get(&self, url: Url, known_tag: Option<&str>) -> L10nResult<Response> {
        self.rate_limiter.until_ready().await;
        let mut request = self
            .client
            .get(url)
            .bearer_auth(&self.auth_token)
            .header(header::ACCEPT, "application/json");
        if let Some(tag) = known_tag {
            request = request.header(header::IF_NONE_MATCH, tag);
        }
        Ok(request.send().await?)
    }
}

#[async_trait]
impl TranslationTransport for HttpTransport {
    async fn fetch_translations(
        &self,
        locale: LocaleCode,
        known_version: Option<String>,
        known_tag: Option<String>,
    ) -> L10nResult<FetchResponse> {
        let mut url = self.endpoint("translations")?;
        url.query_pairs_mut().append_pair("locale", locale.code());
        if let Some(version) = &known_version {
            url.query_pairs_mut().append_pair("version", version);
        }
        debug!(%url, "fetching translations");

        let response = self.get(url, known_tag.as_deref()).await?;

        if response.status() == StatusCode::NOT_MODIFIED {
            return Ok(FetchResponse::NotModified);
        }
        if !response.status().is_success() {
            return Err(Self::classify_status(locale, &response));
        }

        let etag = response
            .headers()
            .get(header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let delta_sync = response
            .headers()
            .get(DELTA_SYNC_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let envelope: TranslationsResponse = response.json().await?;
        // Body-level flag wins when the header is absent
        let delta_sync = delta_sync
            || envelope
                .meta
                .as_ref()
                .map(|m| m.delta_sync)
                .unwrap_or(false);

        Ok(FetchResponse::Body {
            envelope,
            etag,
            delta_sync,
        })
    }

    async fn fetch_legacy(&self, locale: LocaleCode) -> L10nResult<LegacySnapshot> {
        let url = self.endpoint(&format!("translations/{}", locale.code()))?;
        debug!(%url, "fetching translations from legacy endpoint");

        let response = self.get(url, None).await?;
        if !response.status().is_success() {
            return Err(Self::classify_status(locale, &response));
        }
        Ok(response.json().await?)
    }

    async fn fetch_direct(&self, locale: LocaleCode) -> L10nResult<LegacySnapshot> {
        let mut url = self.endpoint("store/translations")?;
        url.query_pairs_mut().append_pair("locale", locale.code());
        debug!(%url, "fetching translations directly from datastore");

        let response = self.get(url, None).await?;
        if !response.status().is_success() {
            return Err(Self::classify_status(locale, &response));
        }
        Ok(response.json().await?)
    }

    async fn translate_content(
        &self,
        request: &TranslateContentRequest,
    ) -> L10nResult<TranslateContentResponse> {
        let url = self.endpoint("translations/content")?;
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.auth_token)
            .json(request)
            .send()
            .await?;
        if !response.status().is_success() {
            let locale = LocaleCode::from_code(&request.target_locale)
                .unwrap_or_default();
            return Err(Self::classify_status(locale, &response));
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_construction() {
        let config = SyncConfig::new("https://api.example.test/functions/v1/", "token");
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(
            transport.endpoint("translations").unwrap().as_str(),
            "https://api.example.test/functions/v1/translations"
        );
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let config = SyncConfig::new("not a url", "token");
        assert!(HttpTransport::new(&config).is_err());
    }
}
