//! Persisted "use tool server" preference.

use crate::connection::ports::{PreferenceResult, PreferenceStore};
use std::sync::Arc;

/// Key under which the feature flag is stored.
pub const USE_TOOL_SERVER_KEY: &str = "use_tool_server";

/// Reads and writes the flag that switches tool server connections on.
///
/// The flag defaults to on. Read failures fall back to the default so a
/// broken preference file never disables the feature by accident.
#[derive(Debug)]
pub struct ToolServerPreference<S>
where
    S: PreferenceStore,
{
    store: Arc<S>,
}

impl<S> Clone for ToolServerPreference<S>
where
    S: PreferenceStore,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> ToolServerPreference<S>
where
    S: PreferenceStore,
{
    /// Value used when nothing is stored.
    pub const DEFAULT: bool = true;

    /// Creates a preference service over `store`.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Returns the stored flag, or [`Self::DEFAULT`] when unset or
    /// unreadable.
    pub async fn load(&self) -> bool {
        match self.store.load_flag(USE_TOOL_SERVER_KEY).await {
            Ok(stored) => stored.unwrap_or(Self::DEFAULT),
            Err(err) => {
                tracing::warn!(error = %err, "could not read tool server preference");
                Self::DEFAULT
            }
        }
    }

    /// Persists the flag.
    ///
    /// # Errors
    ///
    /// Returns the store's error when the write fails.
    pub async fn store(&self, enabled: bool) -> PreferenceResult<()> {
        self.store.store_flag(USE_TOOL_SERVER_KEY, enabled).await
    }
}
