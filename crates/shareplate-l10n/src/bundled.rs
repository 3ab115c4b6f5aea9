//! Bundled base strings shipped with the app binary
//!
//! The asset pipeline that produces the bundles is outside this crate;
//! the engine consumes them through [`BundledCatalog`] as a read-only
//! key-value source keyed by locale. Loading is synchronous and must
//! never touch the network.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::keystore::KeyStore;
use crate::locale::LocaleCode;

/// Read-only source of bundled base translations
pub trait BundledCatalog: Send + Sync {
    /// Load the bundled tree for a locale
    ///
    /// Falls back to the default locale's tree when the requested locale
    /// has no bundle; the default locale itself is always present.
    fn load(&self, locale: LocaleCode) -> KeyStore;
}

/// In-memory catalog built from pre-decoded trees
///
/// Production wiring decodes the bundled JSON assets once at startup and
/// hands the trees to this catalog; tests construct it directly.
pub struct StaticCatalog {
    default_locale: LocaleCode,
    trees: RwLock<HashMap<LocaleCode, KeyStore>>,
}

impl StaticCatalog {
    pub fn new(default_locale: LocaleCode, default_tree: KeyStore) -> Self {
        let mut trees = HashMap::new();
        trees.insert(default_locale, default_tree);
        Self {
            default_locale,
            trees: RwLock::new(trees),
        }
    }

    /// Register the bundled tree for an additional locale
    pub fn insert(&self, locale: LocaleCode, tree: KeyStore) {
        self.trees.write().insert(locale, tree);
    }
}

impl BundledCatalog for StaticCatalog {
    fn load(&self, locale: LocaleCode) -> KeyStore {
        let trees = self.trees.read();
        trees
            .get(&locale)
            .or_else(|| trees.get(&self.default_locale))
            .cloned()
            .unwrap_or_default()
    }
}

/// Platform-native localized strings (e.g. OS-provided resources), used
/// as a lookup fallback between the synced tree and the raw key
pub trait NativeStringSource: Send + Sync {
    fn localized(&self, key: &str, locale: LocaleCode) -> Option<String>;
}
