//! Wire types for the `/translations` backend endpoints

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::keystore::KeyStore;
use crate::locale::LocaleCode;

/// Envelope returned by the primary translations endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationsResponse {
    pub success: bool,
    pub data: Option<TranslationData>,
    #[serde(default)]
    pub delta: Option<DeltaPayload>,
    #[serde(default)]
    pub meta: Option<ResponseMeta>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Full-snapshot body: the complete message tree plus its version
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationData {
    pub messages: serde_json::Value,
    pub locale: Option<String>,
    pub version: Option<String>,
    #[serde(rename = "updatedAt", alias = "updated_at")]
    pub updated_at: Option<String>,
}

/// Incremental changes since a client-known version
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeltaPayload {
    #[serde(default)]
    pub added: HashMap<String, String>,
    #[serde(default)]
    pub updated: HashMap<String, DeltaChange>,
    #[serde(default)]
    pub deleted: Vec<String>,
}

/// One updated entry in a delta
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeltaChange {
    pub old: Option<String>,
    pub new: String,
}

/// Response metadata flags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMeta {
    #[serde(rename = "deltaSync", default)]
    pub delta_sync: bool,
    #[serde(default)]
    pub cached: bool,
}

/// Body returned by the legacy endpoint and the direct datastore read
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacySnapshot {
    pub messages: serde_json::Value,
    pub version: Option<String>,
}

/// What a conditional fetch against the transport produced
#[derive(Debug)]
pub enum FetchResponse {
    /// HTTP 304: the client's cached copy is current
    NotModified,
    /// A decoded envelope plus response headers of interest
    Body {
        envelope: TranslationsResponse,
        etag: Option<String>,
        delta_sync: bool,
    },
}

/// Outcome of [`RemoteSyncClient::fetch`](crate::client::RemoteSyncClient::fetch)
#[derive(Debug)]
pub enum FetchResult {
    /// Server confirmed the cached copy is current
    Unchanged,
    /// Complete replacement tree
    FullSnapshot {
        tree: KeyStore,
        version: Option<String>,
        tag: Option<String>,
    },
    /// Incremental changes to apply against the known version
    Delta {
        payload: DeltaPayload,
        version: Option<String>,
        tag: Option<String>,
    },
}

/// Request body for dynamic content translation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateContentRequest {
    pub content: String,
    #[serde(rename = "sourceLocale")]
    pub source_locale: Option<String>,
    #[serde(rename = "targetLocale")]
    pub target_locale: String,
    #[serde(rename = "contentType")]
    pub content_type: Option<String>,
}

/// Response body for dynamic content translation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateContentResponse {
    pub success: bool,
    pub translation: Option<String>,
    #[serde(default)]
    pub cached: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Durable per-locale cache record
///
/// `messages` is the remote snapshot as fetched, before the bundled base
/// is merged in, so deltas always apply against the tree they were
/// computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub locale: LocaleCode,
    pub messages: KeyStore,
    pub version: Option<String>,
    pub tag: Option<String>,
    #[serde(rename = "lastSync")]
    pub last_sync: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_payload_defaults() {
        let delta: DeltaPayload = serde_json::from_str(r#"{"added": {"a.b": "v"}}"#).unwrap();
        assert_eq!(delta.added.len(), 1);
        assert!(delta.updated.is_empty());
        assert!(delta.deleted.is_empty());
    }

    #[test]
    fn test_envelope_decodes_camel_case() {
        let json = r#"{
            "success": true,
            "data": { "messages": {"common": {"ok": "OK"}}, "version": "42", "updatedAt": "2026-01-01T00:00:00Z" },
            "meta": { "deltaSync": false, "cached": true }
        }"#;
        let envelope: TranslationsResponse = serde_json::from_str(json).unwrap();
        assert!(envelope.success);
        let data = envelope.data.unwrap();
        assert_eq!(data.version.as_deref(), Some("42"));
        assert!(!envelope.meta.unwrap().delta_sync);
    }

    #[test]
    fn test_cache_record_wire_shape() {
        let record = CacheRecord {
            locale: LocaleCode::Russian,
            messages: KeyStore::new(),
            version: Some("7".into()),
            tag: Some("\"abc\"".into()),
            last_sync: Utc::now(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["locale"], "ru");
        assert!(json["lastSync"].is_string());
    }
}
