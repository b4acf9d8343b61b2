//! In-memory preference store.

use crate::connection::ports::{PreferenceError, PreferenceResult, PreferenceStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory preference store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPreferenceStore {
    flags: Arc<RwLock<HashMap<String, bool>>>,
}

impl InMemoryPreferenceStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferenceStore for InMemoryPreferenceStore {
    async fn load_flag(&self, key: &str) -> PreferenceResult<Option<bool>> {
        let flags = self
            .flags
            .read()
            .map_err(|err| PreferenceError::Lock(err.to_string()))?;
        Ok(flags.get(key).copied())
    }

    async fn store_flag(&self, key: &str, value: bool) -> PreferenceResult<()> {
        let mut flags = self
            .flags
            .write()
            .map_err(|err| PreferenceError::Lock(err.to_string()))?;
        flags.insert(key.to_owned(), value);
        Ok(())
    }
}
