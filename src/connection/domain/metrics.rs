//! Cumulative connection metrics.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cumulative connect outcome counters for one supervisor.
///
/// Metrics are never reset during the lifetime of the supervisor. Only the
/// counters and the average are serialised; deserialising rebuilds the
/// running total from them, so later successes keep averaging correctly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "MetricsRecord")]
pub struct ConnectionMetrics {
    success_count: u64,
    failure_count: u64,
    average_connect_ms: u64,
    #[serde(skip_serializing)]
    total_connect_ms: u64,
}

#[derive(Deserialize)]
struct MetricsRecord {
    success_count: u64,
    failure_count: u64,
    average_connect_ms: u64,
}

impl From<MetricsRecord> for ConnectionMetrics {
    fn from(record: MetricsRecord) -> Self {
        Self {
            success_count: record.success_count,
            failure_count: record.failure_count,
            average_connect_ms: record.average_connect_ms,
            total_connect_ms: record
                .average_connect_ms
                .saturating_mul(record.success_count),
        }
    }
}

impl ConnectionMetrics {
    /// Creates empty metrics.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            success_count: 0,
            failure_count: 0,
            average_connect_ms: 0,
            total_connect_ms: 0,
        }
    }

    /// Records a successful connect that took `duration`.
    ///
    /// The average equals `(avg * n + duration) / (n + 1)`, kept exact by
    /// accumulating the total and truncating to whole milliseconds.
    pub fn record_success(&mut self, duration: Duration) {
        let duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        self.total_connect_ms = self.total_connect_ms.saturating_add(duration_ms);
        self.success_count = self.success_count.saturating_add(1);
        self.average_connect_ms = self
            .total_connect_ms
            .checked_div(self.success_count)
            .unwrap_or(0);
    }

    /// Records one failed connect try.
    pub const fn record_failure(&mut self) {
        self.failure_count = self.failure_count.saturating_add(1);
    }

    /// Returns the number of successful connects.
    #[must_use]
    pub const fn success_count(&self) -> u64 {
        self.success_count
    }

    /// Returns the number of failed connect tries.
    #[must_use]
    pub const fn failure_count(&self) -> u64 {
        self.failure_count
    }

    /// Returns the mean duration of successful connects in milliseconds.
    #[must_use]
    pub const fn average_connect_ms(&self) -> u64 {
        self.average_connect_ms
    }
}
