//! Durable per-locale translation cache records
//!
//! One JSON file per locale under the cache directory. Reads degrade to
//! "no cached record" on any failure: a corrupt or mismatched record
//! only costs a cold sync, never an error surfaced to the caller.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{L10nError, L10nResult};
use crate::locale::LocaleCode;
use crate::protocol::CacheRecord;

/// Durable storage for [`CacheRecord`]s, single writer (the coordinator)
#[derive(Debug, Clone)]
pub struct PersistentCacheStore {
    dir: PathBuf,
}

impl PersistentCacheStore {
    /// Create a store rooted at `dir`; the directory is created lazily on
    /// the first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn record_path(&self, locale: LocaleCode) -> PathBuf {
        self.dir.join(format!("translations_{}.json", locale.code()))
    }

    /// Load the record for a locale
    ///
    /// Returns `None` when the file is absent, unreadable, corrupt, or
    /// names a different locale than requested.
    pub async fn load(&self, locale: LocaleCode) -> Option<CacheRecord> {
        let path = self.record_path(locale);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read cache record");
                return None;
            }
        };
        let record: CacheRecord = match serde_json::from_slice(&bytes) {
            Ok(record) => record,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "discarding corrupt cache record");
                return None;
            }
        };
        if record.locale != locale {
            warn!(
                expected = %locale,
                found = %record.locale,
                "discarding cache record with mismatched locale"
            );
            return None;
        }
        debug!(locale = %locale, version = ?record.version, "loaded cache record");
        Some(record)
    }

    /// Atomically overwrite the record for its locale
    pub async fn save(&self, record: &CacheRecord) -> L10nResult<()> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            L10nError::cache_corrupted(record.locale.code(), format!("cache dir: {e}"))
        })?;

        let path = self.record_path(record.locale);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(record)?;

        write_atomic(&tmp, &path, &bytes).await.map_err(|e| {
            L10nError::cache_corrupted(record.locale.code(), format!("write failed: {e}"))
        })?;

        debug!(locale = %record.locale, version = ?record.version, "saved cache record");
        Ok(())
    }

    /// Remove the record for a locale, if present
    pub async fn clear(&self, locale: LocaleCode) -> L10nResult<()> {
        let path = self.record_path(locale);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(L10nError::cache_corrupted(
                locale.code(),
                format!("clear failed: {e}"),
            )),
        }
    }
}

async fn write_atomic(tmp: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    tokio::fs::write(tmp, bytes).await?;
    tokio::fs::rename(tmp, path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::KeyStore;
    use chrono::Utc;
    use tempfile::TempDir;

    fn record(locale: LocaleCode) -> CacheRecord {
        let messages = KeyStore::from_value(serde_json::json!({
            "common": { "ok": "OK" }
        }))
        .unwrap();
        CacheRecord {
            locale,
            messages,
            version: Some("12".to_string()),
            tag: Some("\"etag-12\"".to_string()),
            last_sync: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = PersistentCacheStore::new(dir.path());

        let original = record(LocaleCode::English);
        store.save(&original).await.unwrap();

        let loaded = store.load(LocaleCode::English).await.unwrap();
        assert_eq!(loaded, original);
    }

    #[tokio::test]
    async fn test_load_missing_returns_none() {
        let dir = TempDir::new().unwrap();
        let store = PersistentCacheStore::new(dir.path());
        assert!(store.load(LocaleCode::French).await.is_none());
    }

    #[tokio::test]
    async fn test_load_wrong_locale_returns_none() {
        let dir = TempDir::new().unwrap();
        let store = PersistentCacheStore::new(dir.path());

        // Write an "en" record into the slot for "de"
        let sneaky = record(LocaleCode::English);
        let path = dir.path().join("translations_de.json");
        std::fs::write(&path, serde_json::to_vec(&sneaky).unwrap()).unwrap();

        assert!(store.load(LocaleCode::German).await.is_none());
    }

    #[tokio::test]
    async fn test_load_corrupt_returns_none() {
        let dir = TempDir::new().unwrap();
        let store = PersistentCacheStore::new(dir.path());

        let path = dir.path().join("translations_en.json");
        std::fs::write(&path, b"{ not json").unwrap();

        assert!(store.load(LocaleCode::English).await.is_none());
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = PersistentCacheStore::new(dir.path());

        store.save(&record(LocaleCode::Polish)).await.unwrap();
        store.clear(LocaleCode::Polish).await.unwrap();
        store.clear(LocaleCode::Polish).await.unwrap();
        assert!(store.load(LocaleCode::Polish).await.is_none());
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_record() {
        let dir = TempDir::new().unwrap();
        let store = PersistentCacheStore::new(dir.path());

        let mut rec = record(LocaleCode::English);
        store.save(&rec).await.unwrap();
        rec.version = Some("13".to_string());
        store.save(&rec).await.unwrap();

        let loaded = store.load(LocaleCode::English).await.unwrap();
        assert_eq!(loaded.version.as_deref(), Some("13"));
    }
}
