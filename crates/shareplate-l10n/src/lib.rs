//! Localization engine for the SharePlate app
//!
//! This crate keeps per-locale translation trees synchronized with the
//! SharePlate backend and serves lookups from local caches. It includes:
//!
//! - Hierarchical key→string trees with dotted-path lookup
//! - Conditional and delta sync against the translations endpoint
//! - A flat O(1) lookup cache with hit/miss metrics
//! - Disk persistence for offline startup
//! - Stale-while-revalidate refresh with retry and backoff
//! - Concurrency-safe locale switching
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use shareplate_l10n::{
//!     HttpTransport, KeyStore, LocaleCode, NoopProfileStore, NoopTelemetry,
//!     PersistentCacheStore, StaticCatalog, SyncConfig, SyncCoordinator,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SyncConfig::new("https://api.shareplate.app/api/v1", "token");
//! let transport = Arc::new(HttpTransport::new(&config)?);
//! let bundled = StaticCatalog::new(LocaleCode::English, KeyStore::new());
//! let coordinator = Arc::new(SyncCoordinator::new(
//!     config,
//!     transport,
//!     Arc::new(bundled),
//!     PersistentCacheStore::new("/var/cache/shareplate"),
//!     Arc::new(NoopTelemetry),
//!     Arc::new(NoopProfileStore),
//! ));
//! coordinator.start().await;
//!
//! let greeting = coordinator.lookup("home.greeting");
//! println!("{}", greeting);
//! # Ok(())
//! # }
//! ```

pub mod bundled;
pub mod client;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod flat_cache;
pub mod keystore;
pub mod locale;
pub mod pluralization;
pub mod profile;
pub mod protocol;
pub mod store;
pub mod telemetry;
pub mod transport;

pub use bundled::{BundledCatalog, NativeStringSource, StaticCatalog};
pub use client::RemoteSyncClient;
pub use config::SyncConfig;
pub use coordinator::{SyncCoordinator, SyncState};
pub use error::{L10nError, L10nResult};
pub use flat_cache::{FlatCache, FlatCacheMetrics};
pub use keystore::KeyStore;
pub use locale::{LocaleCode, TextDirection};
pub use pluralization::{ordinal_category, plural_category, PluralCategory};
pub use profile::{NoopProfileStore, ProfilePreferenceStore};
pub use protocol::{CacheRecord, DeltaPayload, FetchResult};
pub use store::PersistentCacheStore;
pub use telemetry::{MissingKeyTracker, NoopTelemetry, TelemetrySink};
pub use transport::{HttpTransport, TranslationTransport};
