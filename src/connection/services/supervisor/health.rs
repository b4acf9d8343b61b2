//! Periodic liveness probe and automatic reconnect.

use super::{ConnectionSupervisor, ReconnectError, SupervisorInner};
use crate::connection::{
    domain::{ConnectionStatus, ConnectionTarget},
    ports::{Notifier, ToolServerHandle, ToolServerProvider},
};
use mockable::Clock;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

impl<P, N, C> ConnectionSupervisor<P, N, C>
where
    P: ToolServerProvider + 'static,
    N: Notifier + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Replaces any running health check with one probing `server`.
    pub(super) fn setup_health_check(&self, server: Arc<P::Server>) {
        let period = self.inner.config.health_check_interval();
        let handle = tokio::spawn(Self::run_health_check(
            Arc::downgrade(&self.inner),
            server,
            period,
        ));
        self.with_state(|state| {
            state.cancel_health_check();
            state.health_check = Some(handle);
        });
    }

    async fn run_health_check(
        supervisor: Weak<SupervisorInner<P, N, C>>,
        server: Arc<P::Server>,
        period: Duration,
    ) {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let Some(inner) = supervisor.upgrade() else {
                tracing::debug!("supervisor dropped; health check stopped");
                return;
            };
            if server.is_connection_active() {
                continue;
            }
            Self { inner }.handle_lost_connection(&server);
            return;
        }
    }

    /// Marks the connection lost and schedules one detached reconnect.
    fn handle_lost_connection(&self, server: &Arc<P::Server>) {
        let lost_target = self.with_state(|state| {
            let current = state
                .server
                .as_ref()
                .is_some_and(|held| Arc::ptr_eq(held, server));
            if !current {
                return None;
            }
            state.transition(ConnectionStatus::Error);
            state.has_error = true;
            state.server = None;
            // Dropping our own handle detaches this task instead of aborting it.
            state.health_check = None;
            state.target.clone()
        });
        let Some(target) = lost_target else {
            tracing::debug!("health check stopped; server was already replaced");
            return;
        };

        tracing::warn!(connection = %target, "health check failed; connection lost");
        if self.is_connecting() {
            tracing::debug!(connection = %target, "auto reconnect skipped; attempt in flight");
            return;
        }

        let supervisor = self.clone();
        tokio::spawn(async move { supervisor.auto_reconnect(&target).await });
    }

    /// Reconnects after a lost connection.
    ///
    /// A throttled attempt is retried once after the remaining interval so a
    /// drop shortly after a manual reconnect does not leave the status stuck.
    async fn auto_reconnect(&self, target: &ConnectionTarget) {
        let mut outcome = self.try_reconnect().await;
        if let Err(ReconnectError::TooSoon { remaining }) = outcome {
            tracing::warn!(
                connection = %target,
                delay_ms = u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX),
                "auto reconnect throttled; retrying after the minimum interval"
            );
            tokio::time::sleep(remaining).await;
            outcome = self.try_reconnect().await;
        }
        match outcome {
            Ok(()) => tracing::info!(connection = %target, "auto reconnect succeeded"),
            Err(err) => {
                tracing::warn!(connection = %target, error = %err, "auto reconnect failed");
            }
        }
    }
}
