//! Validated identifier for the scope a connection belongs to.

use super::ConnectionDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier a connection is scoped to, such as a project or
/// session key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionTarget(String);

impl ConnectionTarget {
    /// Creates a validated connection target.
    ///
    /// The input is trimmed; case is preserved because the identifier is
    /// opaque to this crate.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionDomainError::EmptyTarget`] when the value is empty
    /// after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, ConnectionDomainError> {
        let normalized = value.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(ConnectionDomainError::EmptyTarget);
        }
        Ok(Self(normalized))
    }

    /// Returns the target as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ConnectionTarget {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
