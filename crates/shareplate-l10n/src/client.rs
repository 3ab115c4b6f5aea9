//! Remote sync client: conditional fetches, retry with backoff, and the
//! primary → legacy → direct-datastore fallback chain

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_retry::strategy::ExponentialBackoff;
use tracing::{debug, instrument, warn};

use crate::config::SyncConfig;
use crate::error::{L10nError, L10nResult};
use crate::keystore::KeyStore;
use crate::locale::LocaleCode;
use crate::protocol::{
    FetchResponse, FetchResult, LegacySnapshot, TranslateContentRequest,
    TranslateContentResponse,
};
use crate::transport::TranslationTransport;

/// Backoff delays for retryable errors
///
/// Delays follow `tokio-retry`'s exponential strategy (`base_ms ^ attempt`
/// milliseconds), capped at `max`. Fixed, no jitter: sync traffic is low
/// volume and reproducible delays are easier to reason about in tests.
pub fn backoff_delays(base_ms: u64, max: Duration, attempts: usize) -> Vec<Duration> {
    ExponentialBackoff::from_millis(base_ms)
        .max_delay(max)
        .take(attempts)
        .collect()
}

/// Fetches authoritative translation data for a locale
///
/// Retries retryable errors per stage, then falls back to the next data
/// source only when the prior stage raised (an `Unchanged` outcome stops
/// the chain, since the cache is already current).
pub struct RemoteSyncClient {
    transport: Arc<dyn TranslationTransport>,
    config: SyncConfig,
}

impl RemoteSyncClient {
    pub fn new(transport: Arc<dyn TranslationTransport>, config: SyncConfig) -> Self {
        Self { transport, config }
    }

    /// Conditional fetch for one locale
    ///
    /// `known_version`/`known_tag` make the request conditional: the
    /// server may answer `Unchanged`, a delta against `known_version`, or
    /// a full snapshot.
    #[instrument(skip(self), fields(locale = %locale))]
    pub async fn fetch(
        &self,
        locale: LocaleCode,
        known_version: Option<&str>,
        known_tag: Option<&str>,
    ) -> L10nResult<FetchResult> {
        let primary = self
            .with_retry("primary endpoint", || {
                self.transport.fetch_translations(
                    locale,
                    known_version.map(str::to_string),
                    known_tag.map(str::to_string),
                )
            })
            .await;

        // A stage "raises" both on transport errors and on a body that
        // cannot be turned into a usable result; either moves the chain on.
        let primary_err = match primary.and_then(|response| interpret_response(locale, response)) {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };
        warn!(error = %primary_err, "primary translation endpoint failed, trying legacy");

        let legacy = self
            .with_retry("legacy endpoint", || self.transport.fetch_legacy(locale))
            .await;
        let legacy_err = match legacy.and_then(snapshot_result) {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };
        warn!(error = %legacy_err, "legacy endpoint failed, trying direct datastore read");

        let direct = self
            .with_retry("direct datastore", || self.transport.fetch_direct(locale))
            .await;
        match direct.and_then(snapshot_result) {
            Ok(result) => Ok(result),
            Err(e) => {
                warn!(error = %e, "all translation sources failed");
                Err(e)
            }
        }
    }

    /// Translate one piece of dynamic content
    pub async fn translate_content(
        &self,
        request: &TranslateContentRequest,
    ) -> L10nResult<TranslateContentResponse> {
        self.with_retry("content translation", || {
            self.transport.translate_content(request)
        })
        .await
    }

    /// Retry a single stage on retryable errors, honouring any
    /// `Retry-After` hint while attempts remain. Once the ceiling is hit
    /// the final error (including the hint) surfaces to the caller.
    async fn with_retry<T, F, Fut>(&self, stage: &str, op: F) -> L10nResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = L10nResult<T>>,
    {
        let mut delays = backoff_delays(
            self.config.base_backoff_ms,
            self.config.max_backoff,
            self.config.max_retries,
        )
        .into_iter();

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() => {
                    let Some(delay) = delays.next() else {
                        debug!(stage, error = %e, "retry attempts exhausted");
                        return Err(e);
                    };
                    let wait = match &e {
                        L10nError::RateLimited {
                            retry_after: Some(hint),
                        } => (*hint).max(delay),
                        _ => delay,
                    };
                    warn!(stage, error = %e, wait_ms = wait.as_millis() as u64, "retrying after error");
                    tokio::time::sleep(wait).await;
                }
                Err(e) => {
                    debug!(stage, error = %e, "non-retryable error");
                    return Err(e);
                }
            }
        }
    }
}

fn snapshot_result(snapshot: LegacySnapshot) -> L10nResult<FetchResult> {
    Ok(FetchResult::FullSnapshot {
        tree: KeyStore::from_value(snapshot.messages)?,
        version: snapshot.version,
        tag: None,
    })
}

fn interpret_response(locale: LocaleCode, response: FetchResponse) -> L10nResult<FetchResult> {
    match response {
        FetchResponse::NotModified => Ok(FetchResult::Unchanged),
        FetchResponse::Body {
            envelope,
            etag,
            delta_sync,
        } => {
            if !envelope.success {
                return Err(L10nError::sync_failed(
                    locale.code(),
                    envelope
                        .error
                        .unwrap_or_else(|| "server reported failure".to_string()),
                ));
            }
            let version = envelope.data.as_ref().and_then(|d| d.version.clone());
            if delta_sync {
                if let Some(payload) = envelope.delta {
                    return Ok(FetchResult::Delta {
                        payload,
                        version,
                        tag: etag,
                    });
                }
                // Delta flag without a delta body: fall through to the
                // snapshot if one was included
            }
            let data = envelope
                .data
                .ok_or_else(|| L10nError::parse("response contained neither data nor delta"))?;
            Ok(FetchResult::FullSnapshot {
                tree: KeyStore::from_value(data.messages)?,
                version: data.version,
                tag: etag,
            })
        }
    }
}
