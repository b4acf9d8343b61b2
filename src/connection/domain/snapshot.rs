//! Point-in-time view of a supervised connection.

use super::{ConnectionMetrics, ConnectionStatus, ConnectionTarget};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Serialisable view of supervisor state for status displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSnapshot {
    /// Target the supervisor is scoped to, if any.
    pub target: Option<ConnectionTarget>,
    /// Current status.
    pub status: ConnectionStatus,
    /// Retry counter of the current or last attempt series.
    pub attempt: u32,
    /// Whether the last series failed or a health check detected a drop.
    pub has_error: bool,
    /// Whether a connect series is in flight.
    pub is_connecting: bool,
    /// Time of the last accepted `reconnect` call.
    pub last_attempt_at: Option<DateTime<Utc>>,
    /// Cumulative metrics.
    pub metrics: ConnectionMetrics,
}
