//! Demonstrates offline-first startup: bundled strings serve immediately,
//! a persisted cache restores on the second run, and a sync is attempted
//! in the background.
//!
//! ```sh
//! SHAREPLATE_API_URL=https://api.shareplate.app/api/v1 \
//! SHAREPLATE_API_TOKEN=... \
//! cargo run --example offline_demo
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use shareplate_common::logging::init_default_logging;
use shareplate_l10n::{
    HttpTransport, KeyStore, LocaleCode, NoopProfileStore, NoopTelemetry, PersistentCacheStore,
    StaticCatalog, SyncConfig, SyncCoordinator, TranslationTransport,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_default_logging()?;

    let base_url = std::env::var("SHAREPLATE_API_URL")
        .unwrap_or_else(|_| "https://api.shareplate.app/api/v1".to_string());
    let token = std::env::var("SHAREPLATE_API_TOKEN").unwrap_or_default();

    let config = SyncConfig::new(base_url, token)
        .with_default_locale(LocaleCode::English)
        .with_staleness_threshold(Duration::from_secs(3600));

    let bundled = KeyStore::from_value(json!({
        "app": { "name": "SharePlate" },
        "home": {
            "greeting": "Share a meal, share a moment",
            "cta": "Browse nearby food"
        },
        "listings": {
            "count": {
                "one": "{n} listing nearby",
                "other": "{n} listings nearby"
            }
        }
    }))?;

    let transport: Arc<dyn TranslationTransport> = Arc::new(HttpTransport::new(&config)?);
    let coordinator = Arc::new(SyncCoordinator::new(
        config,
        transport,
        Arc::new(StaticCatalog::new(LocaleCode::English, bundled)),
        PersistentCacheStore::new(std::env::temp_dir().join("shareplate-l10n-demo")),
        Arc::new(NoopTelemetry),
        Arc::new(NoopProfileStore),
    ));

    // Bundled strings resolve before any network or disk I/O completes
    println!("{}", coordinator.lookup("home.greeting"));

    coordinator.start().await;

    // Give the background sync a moment, then show what resolved
    tokio::time::sleep(Duration::from_secs(2)).await;
    println!("state: {:?}", coordinator.state());
    println!("{}", coordinator.lookup("home.cta"));
    println!("{}", coordinator.lookup_plural("listings.count", 1));
    println!("{}", coordinator.lookup_plural("listings.count", 4));

    let metrics = coordinator.cache_metrics();
    println!(
        "flat cache: {} hits / {} misses",
        metrics.hits(),
        metrics.misses()
    );

    coordinator.shutdown().await;
    Ok(())
}
