//! Error types for connection domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing connection domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConnectionDomainError {
    /// The connection target is empty after trimming.
    #[error("connection target must not be empty")]
    EmptyTarget,

    /// A tool name is empty after trimming.
    #[error("tool name must not be empty")]
    EmptyToolName,

    /// Transitioning between two connection states is invalid.
    #[error("invalid connection status transition: {from} -> {to}")]
    InvalidStatusTransition {
        /// Current status.
        from: String,
        /// Requested target status.
        to: String,
    },
}

/// Error returned while parsing a connection status from its string form.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown connection status: {0}")]
pub struct ParseConnectionStatusError(pub String);
