//! Persisted user preference port.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for preference store operations.
pub type PreferenceResult<T> = Result<T, PreferenceError>;

/// Storage for boolean preferences that survive across sessions.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Reads the flag stored under `key`, or `None` when unset.
    async fn load_flag(&self, key: &str) -> PreferenceResult<Option<bool>>;

    /// Stores `value` under `key`.
    async fn store_flag(&self, key: &str, value: bool) -> PreferenceResult<()>;
}

/// Errors returned by preference store implementations.
#[derive(Debug, Clone, Error)]
pub enum PreferenceError {
    /// Reading or writing the backing medium failed.
    #[error("preference storage error: {0}")]
    Io(Arc<std::io::Error>),

    /// Stored data could not be encoded or decoded.
    #[error("invalid stored preference data: {0}")]
    Serialization(Arc<dyn std::error::Error + Send + Sync>),

    /// In-process state could not be locked.
    #[error("preference store lock poisoned: {0}")]
    Lock(String),
}

impl PreferenceError {
    /// Wraps an I/O failure.
    #[must_use]
    pub fn io(err: std::io::Error) -> Self {
        Self::Io(Arc::new(err))
    }

    /// Wraps an encoding or decoding failure.
    pub fn serialization(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Serialization(Arc::new(err))
    }
}
