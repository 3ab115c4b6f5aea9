//! User profile locale preference, synced best-effort

use async_trait::async_trait;
use tracing::debug;

use crate::error::L10nResult;
use crate::locale::LocaleCode;

/// Best-effort persistence of the user's locale preference
///
/// Failures never block a locale switch; the coordinator writes the
/// preference back from a detached task and logs errors at debug level.
#[async_trait]
pub trait ProfilePreferenceStore: Send + Sync {
    async fn set_locale_preference(&self, locale: LocaleCode) -> L10nResult<()>;
    async fn get_locale_preference(&self) -> L10nResult<Option<LocaleCode>>;
}

/// Store that remembers nothing (standalone/offline use)
pub struct NoopProfileStore;

#[async_trait]
impl ProfilePreferenceStore for NoopProfileStore {
    async fn set_locale_preference(&self, locale: LocaleCode) -> L10nResult<()> {
        debug!(%locale, "dropping locale preference (noop profile store)");
        Ok(())
    }

    async fn get_locale_preference(&self) -> L10nResult<Option<LocaleCode>> {
        Ok(None)
    }
}
