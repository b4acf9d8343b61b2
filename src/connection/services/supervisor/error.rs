//! Errors surfaced by the connection supervisor.

use crate::connection::{
    domain::{ConnectionDomainError, ConnectionTarget},
    ports::ToolServerError,
};
use std::time::Duration;
use thiserror::Error;

/// Why a single connect try failed.
#[derive(Debug, Clone, Error)]
pub enum ConnectError {
    /// The existing-server lookup did not finish in time.
    #[error("server lookup timed out after {0:?}")]
    Timeout(Duration),

    /// The existing-server lookup failed.
    #[error("server lookup failed: {0}")]
    Lookup(#[source] ToolServerError),

    /// Creating or connecting the server failed, or the handle stayed
    /// disconnected.
    #[error("server could not be connected: {0}")]
    ServerCreation(#[source] ToolServerError),

    /// The server did not answer the tool listing used to confirm liveness.
    #[error("tool listing failed: {0}")]
    ToolListing(#[source] ToolServerError),
}

/// Why a reconnect request did not produce a connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconnectError {
    /// No target has been recorded yet.
    #[error("no connection target has been set")]
    NoTarget,

    /// The previous accepted reconnect was too recent.
    #[error("reconnect requested too soon; retry in {remaining:?}")]
    TooSoon {
        /// Time left until a reconnect is accepted.
        remaining: Duration,
    },

    /// A connect series is already in flight.
    #[error("a connection attempt is already in progress")]
    AlreadyConnecting,

    /// The tool server feature is switched off.
    #[error("tool server connections are disabled")]
    Disabled,

    /// The connect series ran and did not succeed.
    #[error("reconnect failed")]
    Failed,
}

impl ReconnectError {
    /// Returns whether the request was rejected before any connect try.
    #[must_use]
    pub const fn is_guard_rejection(&self) -> bool {
        !matches!(self, Self::Failed)
    }
}

/// Failure to close a connection during teardown.
///
/// Teardown is best-effort; this error is logged and never returned.
#[derive(Debug, Clone, Error)]
#[error("failed to close connection for target {target}: {source}")]
pub struct TeardownError {
    /// Target whose connection could not be closed.
    pub target: ConnectionTarget,
    /// Underlying provider failure.
    #[source]
    pub source: ToolServerError,
}

/// Errors returned by supervisor passthrough operations.
#[derive(Debug, Clone, Error)]
pub enum SupervisorError {
    /// No live connection is held.
    #[error("tool server is not connected")]
    NotConnected,

    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] ConnectionDomainError),

    /// The tool server rejected the request.
    #[error(transparent)]
    ToolServer(#[from] ToolServerError),
}

/// Result type for supervisor passthrough operations.
pub type SupervisorResult<T> = Result<T, SupervisorError>;
