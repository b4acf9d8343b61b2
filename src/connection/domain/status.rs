//! Connection status state machine.

use super::{ConnectionDomainError, ParseConnectionStatusError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a supervised connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// No connection is held and none is being attempted.
    #[default]
    Disconnected,
    /// A connection attempt series is in progress.
    Connecting,
    /// A live server handle is held.
    Connected,
    /// The last attempt series failed or a health check detected a drop.
    Error,
}

impl ConnectionStatus {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Error => "error",
        }
    }

    /// Returns whether a server handle may be held in this status.
    #[must_use]
    pub const fn holds_server(self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Returns whether transition to `target` is allowed.
    ///
    /// Teardown may move any status to `disconnected`. `error` is never
    /// terminal: both manual and automatic reconnects leave it through
    /// `connecting`.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (_, Self::Disconnected)
                | (
                    Self::Disconnected | Self::Connected | Self::Error,
                    Self::Connecting
                )
                | (Self::Connecting, Self::Connected | Self::Error)
                | (Self::Connected, Self::Error)
        )
    }

    /// Validates a transition to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionDomainError::InvalidStatusTransition`] when the
    /// transition is not allowed.
    pub fn ensure_transition_to(self, target: Self) -> Result<(), ConnectionDomainError> {
        if self.can_transition_to(target) {
            return Ok(());
        }
        Err(ConnectionDomainError::InvalidStatusTransition {
            from: self.as_str().to_owned(),
            to: target.as_str().to_owned(),
        })
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ConnectionStatus {
    type Error = ParseConnectionStatusError;

    fn try_from(value: &str) -> Result<Self, ParseConnectionStatusError> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "disconnected" => Ok(Self::Disconnected),
            "connecting" => Ok(Self::Connecting),
            "connected" => Ok(Self::Connected),
            "error" => Ok(Self::Error),
            _ => Err(ParseConnectionStatusError(value.to_owned())),
        }
    }
}
