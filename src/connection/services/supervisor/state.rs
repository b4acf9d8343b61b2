//! Mutable state shared by supervisor handles and the health-check task.

use crate::connection::domain::{
    ConnectionMetrics, ConnectionSnapshot, ConnectionStatus, ConnectionTarget,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

pub(super) struct ConnectionState<S> {
    pub(super) target: Option<ConnectionTarget>,
    pub(super) status: ConnectionStatus,
    pub(super) server: Option<Arc<S>>,
    pub(super) attempt: u32,
    pub(super) has_error: bool,
    pub(super) last_attempt_at: Option<DateTime<Utc>>,
    pub(super) last_failure_notice: Option<Instant>,
    pub(super) metrics: ConnectionMetrics,
    pub(super) health_check: Option<JoinHandle<()>>,
}

impl<S> Default for ConnectionState<S> {
    fn default() -> Self {
        Self {
            target: None,
            status: ConnectionStatus::Disconnected,
            server: None,
            attempt: 0,
            has_error: false,
            last_attempt_at: None,
            last_failure_notice: None,
            metrics: ConnectionMetrics::new(),
            health_check: None,
        }
    }
}

impl<S> ConnectionState<S> {
    /// Moves to `next`, logging and ignoring transitions the state machine
    /// forbids.
    pub(super) fn transition(&mut self, next: ConnectionStatus) -> bool {
        if self.status == next {
            return true;
        }
        match self.status.ensure_transition_to(next) {
            Ok(()) => {
                tracing::debug!(from = %self.status, to = %next, "connection status changed");
                self.status = next;
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "ignored connection status transition");
                false
            }
        }
    }

    pub(super) fn cancel_health_check(&mut self) {
        if let Some(handle) = self.health_check.take() {
            handle.abort();
        }
    }

    /// Forgets the target and every per-connection field. Metrics and the
    /// reconnect throttle survive.
    pub(super) fn reset(&mut self) {
        self.cancel_health_check();
        self.transition(ConnectionStatus::Disconnected);
        self.target = None;
        self.server = None;
        self.attempt = 0;
        self.has_error = false;
    }

    pub(super) fn snapshot(&self, is_connecting: bool) -> ConnectionSnapshot {
        ConnectionSnapshot {
            target: self.target.clone(),
            status: self.status,
            attempt: self.attempt,
            has_error: self.has_error,
            is_connecting,
            last_attempt_at: self.last_attempt_at,
            metrics: self.metrics,
        }
    }
}
