//! Stateful orchestrator for locale state, sync scheduling and lookups
//!
//! One coordinator instance is constructed at the application root with
//! its collaborators injected, and shared behind an `Arc`. Lookups are
//! synchronous and lock-free on the hot path: the active (locale, tree)
//! pair is published through an `arc-swap` snapshot and memoized in the
//! flat cache, so readers never observe a half-applied sync.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::bundled::{BundledCatalog, NativeStringSource};
use crate::client::RemoteSyncClient;
use crate::config::SyncConfig;
use crate::error::{L10nError, L10nResult};
use crate::flat_cache::FlatCache;
use crate::keystore::KeyStore;
use crate::locale::LocaleCode;
use crate::pluralization::{plural_category, PluralCategory};
use crate::profile::ProfilePreferenceStore;
use crate::protocol::{CacheRecord, FetchResult, TranslateContentRequest};
use crate::store::PersistentCacheStore;
use crate::telemetry::{MissingKeyTracker, TelemetrySink};
use crate::transport::TranslationTransport;

/// Observable sync state
///
/// `Ready`, `Syncing` and `Offline` are all usable: lookups resolve
/// against cached data. `Loading` and `Error` mean no fetched data
/// exists yet (bundled strings still serve).
#[derive(Debug, Clone, PartialEq)]
pub enum SyncState {
    Idle,
    Loading,
    Ready,
    Syncing,
    Offline { last_good: DateTime<Utc> },
    Error { kind: &'static str },
}

impl SyncState {
    /// Whether lookups are backed by synced data
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Ready | Self::Syncing | Self::Offline { .. })
    }
}

/// The reader-visible pair, swapped atomically on every committed sync
struct ActiveSnapshot {
    locale: LocaleCode,
    tree: KeyStore,
}

/// Removes a locale from the in-flight set when the refresh finishes
///
/// A forced refresh that found the locale already registered never
/// owned the entry, so its drop must leave the set untouched.
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<LocaleCode>>,
    locale: LocaleCode,
    registered: bool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.registered {
            self.set.lock().remove(&self.locale);
        }
    }
}

/// Owns the active locale, the merged translation tree, the sync state
/// machine, background refresh scheduling and missing-key telemetry
pub struct SyncCoordinator {
    config: SyncConfig,
    client: RemoteSyncClient,
    bundled: Arc<dyn BundledCatalog>,
    store: PersistentCacheStore,
    telemetry: Arc<dyn TelemetrySink>,
    profile: Arc<dyn ProfilePreferenceStore>,
    native: Option<Arc<dyn NativeStringSource>>,

    snapshot: ArcSwap<ActiveSnapshot>,
    flat: FlatCache,
    missing: MissingKeyTracker,
    state_tx: watch::Sender<SyncState>,
    content_cache: moka::future::Cache<(String, LocaleCode), String>,

    /// Remote snapshot and sync metadata; sync paths only
    record: tokio::sync::Mutex<Option<CacheRecord>>,
    /// Bumped by every locale switch; in-flight syncs that captured an
    /// older value discard their result instead of clobbering state
    generation: AtomicU64,
    in_flight: Mutex<HashSet<LocaleCode>>,
    sync_task: Mutex<Option<JoinHandle<()>>>,
    background_tasks: Mutex<Vec<JoinHandle<()>>>,
    shutdown: CancellationToken,
}

impl SyncCoordinator {
    /// Construct a coordinator; the bundled base for the default locale
    /// is loaded synchronously so lookups work before any network I/O.
    pub fn new(
        config: SyncConfig,
        transport: Arc<dyn TranslationTransport>,
        bundled: Arc<dyn BundledCatalog>,
        store: PersistentCacheStore,
        telemetry: Arc<dyn TelemetrySink>,
        profile: Arc<dyn ProfilePreferenceStore>,
    ) -> Self {
        let locale = config.default_locale;
        let base = bundled.load(locale);
        let (state_tx, _) = watch::channel(SyncState::Idle);
        let content_cache = moka::future::Cache::builder()
            .max_capacity(config.content_cache_capacity)
            .build();

        Self {
            client: RemoteSyncClient::new(transport, config.clone()),
            missing: MissingKeyTracker::new(
                config.missing_key_batch_size,
                config.missing_key_flush_interval,
            ),
            config,
            bundled,
            store,
            telemetry,
            profile,
            native: None,
            snapshot: ArcSwap::from_pointee(ActiveSnapshot { locale, tree: base }),
            flat: FlatCache::new(),
            state_tx,
            content_cache,
            record: tokio::sync::Mutex::new(None),
            generation: AtomicU64::new(0),
            in_flight: Mutex::new(HashSet::new()),
            sync_task: Mutex::new(None),
            background_tasks: Mutex::new(Vec::new()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Attach a platform-native localized-string fallback source
    pub fn with_native_strings(mut self, native: Arc<dyn NativeStringSource>) -> Self {
        self.native = Some(native);
        self
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Bring the coordinator up: restore the persisted cache, evaluate
    /// staleness, and arm the background tasks. Never blocks on the
    /// network; any needed refresh runs as a spawned task.
    #[instrument(skip(self))]
    pub async fn start(self: &Arc<Self>) {
        let mut locale = self.config.default_locale;
        if let Ok(Some(preferred)) = self.profile.get_locale_preference().await {
            locale = preferred;
        }
        if locale != self.active_locale() {
            self.publish(locale, self.bundled.load(locale));
        }

        self.set_state(SyncState::Loading);

        let mut needs_refresh = true;
        if let Some(record) = self.store.load(locale).await {
            let merged = self.bundled.load(locale).merge(&record.messages);
            self.publish(locale, merged);
            self.flat.invalidate_all();
            let stale = self.is_stale(record.last_sync);
            *self.record.lock().await = Some(record);
            self.set_state(SyncState::Ready);
            needs_refresh = stale;
            info!(%locale, stale, "restored persisted translations");
        } else {
            info!(%locale, "no persisted translations, cold sync needed");
        }

        if needs_refresh {
            self.spawn_locale_sync(locale);
        }
        self.spawn_periodic_refresh();
        self.spawn_missing_key_flusher();
    }

    /// Cancel background tasks and flush any pending missing-key report
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        if let Some(handle) = self.sync_task.lock().take() {
            handle.abort();
        }
        for handle in self.background_tasks.lock().drain(..) {
            handle.abort();
        }
        let leftover = self.missing.take_all();
        if !leftover.is_empty() {
            self.telemetry
                .report_missing_keys(leftover, self.active_locale(), &self.config.app_version)
                .await;
        }
    }

    // ========================================================================
    // Lookups (synchronous, never fail)
    // ========================================================================

    /// Resolve a dotted key to a displayable string
    ///
    /// Fallback order: flat cache → translation tree → native strings →
    /// the raw key itself (recorded as missing). Never errors, never
    /// suspends.
    pub fn lookup(&self, key: &str) -> String {
        if let Some(value) = self.resolve(key) {
            return value;
        }
        if self.missing.record(key) {
            debug!(key, "missing translation");
        }
        key.to_string()
    }

    /// Resolve a pluralized key: `base.category`, falling back to
    /// `base.other` when the category-specific entry is absent
    pub fn lookup_plural(&self, base_key: &str, count: i64) -> String {
        let category = plural_category(self.active_locale(), count);
        let primary = format!("{base_key}.{category}");
        if let Some(value) = self.resolve(&primary) {
            return value;
        }
        if category != PluralCategory::Other {
            if let Some(value) = self.resolve(&format!("{base_key}.other")) {
                return value;
            }
        }
        if self.missing.record(&primary) {
            debug!(key = %primary, "missing plural translation");
        }
        primary
    }

    fn resolve(&self, key: &str) -> Option<String> {
        if let Some(value) = self.flat.get(key) {
            return Some(value);
        }
        let snapshot = self.snapshot.load();
        if let Some(value) = snapshot.tree.lookup(key) {
            let value = value.to_string();
            self.flat.set(key, value.clone());
            return Some(value);
        }
        if let Some(native) = &self.native {
            if let Some(value) = native.localized(key, snapshot.locale) {
                if value != key {
                    self.flat.set(key, value.clone());
                    return Some(value);
                }
            }
        }
        None
    }

    // ========================================================================
    // Sync
    // ========================================================================

    /// Synchronize the given locale against the remote source
    ///
    /// Only one refresh per locale runs concurrently unless `force` is
    /// set; a duplicate call returns immediately. Failures surface
    /// through [`state`](Self::state) (Offline with cache, Error
    /// without) as well as in the returned result.
    #[instrument(skip(self), fields(locale = %locale, force))]
    pub async fn refresh(&self, locale: LocaleCode, force: bool) -> L10nResult<()> {
        // A refresh commits only into the active locale's state; anything
        // else would be discarded at commit time anyway
        if locale != self.active_locale() {
            debug!("skipping refresh for inactive locale");
            return Ok(());
        }
        let _guard = match self.acquire_in_flight(locale, force) {
            Some(guard) => guard,
            None => {
                debug!("refresh already in flight, skipping");
                return Ok(());
            }
        };
        let generation = self.generation.load(Ordering::SeqCst);

        let (known_version, known_tag, last_good) = {
            let record = self.record.lock().await;
            match record.as_ref().filter(|r| r.locale == locale) {
                Some(r) => (r.version.clone(), r.tag.clone(), Some(r.last_sync)),
                None => (None, None, None),
            }
        };
        let have_cache = last_good.is_some();
        self.set_state(if have_cache {
            SyncState::Syncing
        } else {
            SyncState::Loading
        });

        let fetched = self
            .client
            .fetch(locale, known_version.as_deref(), known_tag.as_deref())
            .await;

        match fetched {
            Ok(result) => {
                self.commit(locale, generation, result, known_version, true)
                    .await
            }
            Err(e) => {
                if self.superseded(generation) {
                    debug!("discarding failed sync superseded by locale change");
                    self.rollback_transition();
                    return Ok(());
                }
                if let Some(last_good) = last_good {
                    warn!(error = %e, "sync failed, serving cached translations");
                    self.set_state(SyncState::Offline { last_good });
                } else {
                    warn!(error = %e, "sync failed with no cache");
                    self.set_state(SyncState::Error { kind: e.kind() });
                }
                Err(e)
            }
        }
    }

    /// Switch the active locale
    ///
    /// Cancels any in-flight background sync for the previous locale;
    /// on fetch failure the error propagates and the prior locale and
    /// its cache remain fully active. A switch that is itself
    /// superseded by a newer switch commits nothing.
    #[instrument(skip(self), fields(locale = %new_locale))]
    pub async fn set_locale(&self, new_locale: LocaleCode) -> L10nResult<()> {
        // Cancel the previous locale's background sync so its late
        // response cannot clobber the new locale's state
        if let Some(handle) = self.sync_task.lock().take() {
            handle.abort();
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let persisted = self.store.load(new_locale).await;
        let (known_version, known_tag) = match &persisted {
            Some(r) => (r.version.clone(), r.tag.clone()),
            None => (None, None),
        };

        let fetched = self
            .client
            .fetch(new_locale, known_version.as_deref(), known_tag.as_deref())
            .await?;

        if self.superseded(generation) {
            debug!("locale switch superseded by a newer switch");
            return Ok(());
        }

        let remote = match fetched {
            FetchResult::Unchanged => persisted
                .as_ref()
                .map(|r| r.messages.clone())
                .unwrap_or_default(),
            FetchResult::FullSnapshot { tree, version, tag } => {
                return self
                    .commit_switch(new_locale, generation, tree, version, tag)
                    .await;
            }
            FetchResult::Delta { payload, version, tag } => match &persisted {
                Some(r) => {
                    let tree = r.messages.apply_delta(&payload);
                    return self
                        .commit_switch(new_locale, generation, tree, version, tag)
                        .await;
                }
                None => {
                    // Delta without a base tree cannot be applied
                    return Err(L10nError::sync_failed(
                        new_locale.code(),
                        "received delta without a cached base",
                    ));
                }
            },
        };
        let (version, tag) = match &persisted {
            Some(r) => (r.version.clone(), r.tag.clone()),
            None => (None, None),
        };
        self.commit_switch(new_locale, generation, remote, version, tag)
            .await
    }

    /// Translate dynamic content into the active locale, memoized for
    /// the session
    pub async fn fetch_content_translations(&self, content: &str) -> L10nResult<String> {
        let locale = self.active_locale();
        let cache_key = (content.to_string(), locale);
        if let Some(hit) = self.content_cache.get(&cache_key).await {
            return Ok(hit);
        }

        let request = TranslateContentRequest {
            content: content.to_string(),
            source_locale: None,
            target_locale: locale.code().to_string(),
            content_type: None,
        };
        let response = self.client.translate_content(&request).await?;
        let translation = response
            .translation
            .ok_or_else(|| L10nError::parse("content translation response had no translation"))?;
        self.content_cache
            .insert(cache_key, translation.clone())
            .await;
        Ok(translation)
    }

    // ========================================================================
    // Observability
    // ========================================================================

    /// Current sync state
    pub fn state(&self) -> SyncState {
        self.state_tx.borrow().clone()
    }

    /// Subscribe to sync state transitions
    pub fn subscribe_state(&self) -> watch::Receiver<SyncState> {
        self.state_tx.subscribe()
    }

    /// The locale lookups currently resolve against
    pub fn active_locale(&self) -> LocaleCode {
        self.snapshot.load().locale
    }

    /// Number of keys recorded as missing this session
    pub fn missing_key_count(&self) -> usize {
        self.missing.pending()
    }

    /// Flat cache hit/miss counters
    pub fn cache_metrics(&self) -> &crate::flat_cache::FlatCacheMetrics {
        self.flat.metrics()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn set_state(&self, state: SyncState) {
        self.state_tx.send_replace(state);
    }

    fn publish(&self, locale: LocaleCode, tree: KeyStore) {
        self.snapshot
            .store(Arc::new(ActiveSnapshot { locale, tree }));
    }

    fn superseded(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != generation
    }

    fn is_stale(&self, last_sync: DateTime<Utc>) -> bool {
        let threshold = chrono::TimeDelta::from_std(self.config.staleness_threshold)
            .unwrap_or(chrono::TimeDelta::MAX);
        Utc::now().signed_duration_since(last_sync) > threshold
    }

    fn acquire_in_flight(&self, locale: LocaleCode, force: bool) -> Option<InFlightGuard<'_>> {
        let mut set = self.in_flight.lock();
        let registered = set.insert(locale);
        if !registered && !force {
            return None;
        }
        Some(InFlightGuard {
            set: &self.in_flight,
            locale,
            registered,
        })
    }

    /// Undo a transitional `Syncing`/`Loading` marker left by a sync
    /// whose result was discarded; the winning operation owns the final
    /// state.
    fn rollback_transition(&self) {
        self.state_tx.send_if_modified(|state| match state {
            SyncState::Syncing => {
                *state = SyncState::Ready;
                true
            }
            SyncState::Loading => {
                *state = SyncState::Idle;
                true
            }
            _ => false,
        });
    }

    /// Apply a fetch result for a refresh of `locale`
    ///
    /// `known_version` is the record version the fetch was conditional
    /// on; a delta is only applied when the record still carries that
    /// exact version.
    async fn commit(
        &self,
        locale: LocaleCode,
        generation: u64,
        result: FetchResult,
        known_version: Option<String>,
        allow_delta_retry: bool,
    ) -> L10nResult<()> {
        let mut slot = self.record.lock().await;
        if self.superseded(generation) || self.snapshot.load().locale != locale {
            debug!("discarding sync result superseded by locale change");
            self.rollback_transition();
            return Ok(());
        }
        let now = Utc::now();

        match result {
            FetchResult::Unchanged => {
                if let Some(record) = slot.as_mut() {
                    record.last_sync = now;
                    let record = record.clone();
                    drop(slot);
                    self.persist(record).await;
                }
                self.set_state(SyncState::Ready);
                debug!(%locale, "translations unchanged");
                Ok(())
            }
            FetchResult::FullSnapshot { tree, version, tag } => {
                let merged = self.bundled.load(locale).merge(&tree);
                self.publish(locale, merged);
                self.flat.invalidate_all();
                let record = CacheRecord {
                    locale,
                    messages: tree,
                    version,
                    tag,
                    last_sync: now,
                };
                *slot = Some(record.clone());
                drop(slot);
                self.set_state(SyncState::Ready);
                info!(%locale, version = ?record.version, "applied full translation snapshot");
                self.persist(record).await;
                Ok(())
            }
            FetchResult::Delta { payload, version, tag } => {
                let base = match slot
                    .as_ref()
                    .filter(|r| r.locale == locale && r.version == known_version)
                {
                    Some(record) => record.messages.clone(),
                    None => {
                        drop(slot);
                        if !allow_delta_retry {
                            return Err(L10nError::sync_failed(
                                locale.code(),
                                "delta received without a matching base tree",
                            ));
                        }
                        // The delta was computed against a version we no
                        // longer hold; request a full snapshot instead of
                        // applying it to the wrong tree
                        warn!(%locale, "delta without matching base, refetching full snapshot");
                        let full = self.client.fetch(locale, None, None).await?;
                        return Box::pin(self.commit(locale, generation, full, None, false))
                            .await;
                    }
                };
                let remote = base.apply_delta(&payload);
                let merged = self.bundled.load(locale).merge(&remote);
                self.publish(locale, merged);
                self.flat.invalidate_all();
                let record = CacheRecord {
                    locale,
                    messages: remote,
                    version,
                    tag,
                    last_sync: now,
                };
                *slot = Some(record.clone());
                drop(slot);
                self.set_state(SyncState::Ready);
                info!(
                    %locale,
                    added = payload.added.len(),
                    updated = payload.updated.len(),
                    deleted = payload.deleted.len(),
                    "applied translation delta"
                );
                self.persist(record).await;
                Ok(())
            }
        }
    }

    /// Commit a successful locale switch
    async fn commit_switch(
        &self,
        locale: LocaleCode,
        generation: u64,
        remote: KeyStore,
        version: Option<String>,
        tag: Option<String>,
    ) -> L10nResult<()> {
        let mut slot = self.record.lock().await;
        if self.superseded(generation) {
            debug!("locale switch superseded by a newer switch");
            return Ok(());
        }

        let merged = self.bundled.load(locale).merge(&remote);
        self.publish(locale, merged);
        self.flat.invalidate_all();
        self.missing.clear();
        let record = CacheRecord {
            locale,
            messages: remote,
            version,
            tag,
            last_sync: Utc::now(),
        };
        *slot = Some(record.clone());
        drop(slot);
        self.set_state(SyncState::Ready);
        info!(%locale, "locale switched");
        self.persist(record).await;

        // Best-effort preference write-back, detached so a slow or
        // failing profile service never blocks the switch
        let profile = Arc::clone(&self.profile);
        tokio::spawn(async move {
            if let Err(e) = profile.set_locale_preference(locale).await {
                debug!(error = %e, "locale preference write-back failed");
            }
        });
        Ok(())
    }

    /// Persistence failures are logged and treated as "no cache"
    async fn persist(&self, record: CacheRecord) {
        if let Err(e) = self.store.save(&record).await {
            warn!(error = %e, locale = %record.locale, "failed to persist cache record");
        }
    }

    fn spawn_locale_sync(self: &Arc<Self>, locale: LocaleCode) {
        let coordinator = Arc::clone(self);
        let handle = tokio::spawn(async move {
            if let Err(e) = coordinator.refresh(locale, false).await {
                debug!(error = %e, %locale, "background sync failed");
            }
        });
        if let Some(previous) = self.sync_task.lock().replace(handle) {
            previous.abort();
        }
    }

    fn spawn_periodic_refresh(self: &Arc<Self>) {
        let coordinator = Arc::clone(self);
        let token = self.shutdown.clone();
        let period = self.config.refresh_interval;
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await; // the first tick fires immediately
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        let locale = coordinator.active_locale();
                        // The in-flight guard keeps this from stacking on
                        // top of a foreground refresh
                        if let Err(e) = coordinator.refresh(locale, false).await {
                            debug!(error = %e, %locale, "periodic refresh failed");
                        }
                    }
                }
            }
        });
        self.background_tasks.lock().push(handle);
    }

    fn spawn_missing_key_flusher(self: &Arc<Self>) {
        let coordinator = Arc::clone(self);
        let token = self.shutdown.clone();
        let tick = self
            .config
            .missing_key_flush_interval
            .min(std::time::Duration::from_secs(5));
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick.max(std::time::Duration::from_millis(10)));
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        if let Some(batch) = coordinator.missing.take_batch_if_due() {
                            let locale = coordinator.active_locale();
                            coordinator
                                .telemetry
                                .report_missing_keys(batch, locale, &coordinator.config.app_version)
                                .await;
                        }
                    }
                }
            }
        });
        self.background_tasks.lock().push(handle);
    }
}
