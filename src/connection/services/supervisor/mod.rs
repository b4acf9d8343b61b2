//! Connection supervisor for one tool-server target.
//!
//! The supervisor connects with a bounded lookup timeout, retries failed
//! tries with capped exponential backoff, probes liveness on a fixed
//! interval once connected, and reconnects on its own when a probe fails.
//! Callers observe outcomes through status reads and boolean returns;
//! connection failures are never raised as errors.

mod error;
mod health;
mod state;


pub use error::{ConnectError, ReconnectError, SupervisorError, SupervisorResult, TeardownError};

use crate::connection::{
    domain::{
        CONNECTION_NOTICE_SLOT, ConnectionDomainError, ConnectionMetrics, ConnectionSnapshot,
        ConnectionStatus, ConnectionTarget, Notice, NoticeKind, SupervisorConfig,
        TOOL_EXECUTION_NOTICE_SLOT, ToolDescriptor, ToolResult,
    },
    ports::{Notifier, ToolServerError, ToolServerHandle, ToolServerProvider},
};
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use serde_json::Value;
use state::ConnectionState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

/// Supervises a best-effort connection to a tool server.
///
/// The supervisor is a cheap handle: clones share the same state, gate, and
/// health-check task. At most one connect series runs at a time; a second
/// request while one is in flight is rejected rather than queued.
pub struct ConnectionSupervisor<P, N, C>
where
    P: ToolServerProvider + 'static,
    N: Notifier + 'static,
    C: Clock + Send + Sync + 'static,
{
    inner: Arc<SupervisorInner<P, N, C>>,
}

struct SupervisorInner<P, N, C>
where
    P: ToolServerProvider,
{
    provider: Arc<P>,
    notifier: Arc<N>,
    clock: Arc<C>,
    config: SupervisorConfig,
    enabled: AtomicBool,
    in_flight: AtomicBool,
    series_idle: Notify,
    state: Mutex<ConnectionState<P::Server>>,
}

impl<P, N, C> Clone for ConnectionSupervisor<P, N, C>
where
    P: ToolServerProvider + 'static,
    N: Notifier + 'static,
    C: Clock + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// How a connect series ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SeriesOutcome {
    Connected,
    Exhausted,
    /// The target changed or the feature was disabled mid-series.
    Cancelled,
}

/// Holds the in-flight gate for the lifetime of a connect series.
///
/// Releasing the gate wakes every [`ConnectionSupervisor::wait_until_idle`]
/// caller.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
    idle: &'a Notify,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool, idle: &'a Notify) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag, idle })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
        self.idle.notify_waiters();
    }
}

impl<P, N, C> ConnectionSupervisor<P, N, C>
where
    P: ToolServerProvider + 'static,
    N: Notifier + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates an enabled supervisor with no target.
    ///
    /// `config` is expected to have passed [`SupervisorConfig::validate`].
    #[must_use]
    pub fn new(
        provider: Arc<P>,
        notifier: Arc<N>,
        clock: Arc<C>,
        config: SupervisorConfig,
    ) -> Self {
        Self {
            inner: Arc::new(SupervisorInner {
                provider,
                notifier,
                clock,
                config,
                enabled: AtomicBool::new(true),
                in_flight: AtomicBool::new(false),
                series_idle: Notify::new(),
                state: Mutex::new(ConnectionState::default()),
            }),
        }
    }

    /// Connects to `target`, retrying failed tries with backoff.
    ///
    /// Returns `true` once a live server is held. Returns `false` when the
    /// feature is disabled, when another series is in flight, when every
    /// try failed, or when the target was torn down mid-series.
    pub async fn connect(&self, target: ConnectionTarget) -> bool {
        if !self.is_enabled() {
            tracing::debug!(connection = %target, "connect skipped; tool server disabled");
            return false;
        }
        let Some(_gate) = self.acquire_gate() else {
            tracing::debug!(connection = %target, "connect skipped; attempt already in flight");
            return false;
        };
        self.run_series(target).await == SeriesOutcome::Connected
    }

    /// Reconnects to the current target, subject to throttling.
    ///
    /// Returns `true` when the connection was re-established. See
    /// [`Self::try_reconnect`] for the rejection reasons.
    pub async fn reconnect(&self) -> bool {
        self.try_reconnect().await.is_ok()
    }

    /// Reconnects to the current target and reports why it did not.
    ///
    /// Guard rejections happen before any connect try and are not counted
    /// in the metrics.
    ///
    /// # Errors
    ///
    /// Returns [`ReconnectError::Disabled`] when the feature is off,
    /// [`ReconnectError::NoTarget`] before any target was set,
    /// [`ReconnectError::TooSoon`] within the minimum reconnect interval,
    /// [`ReconnectError::AlreadyConnecting`] while a series is in flight, and
    /// [`ReconnectError::Failed`] when the series did not connect.
    pub async fn try_reconnect(&self) -> Result<(), ReconnectError> {
        if !self.is_enabled() {
            return Err(ReconnectError::Disabled);
        }
        let Some(target) = self.target() else {
            tracing::warn!("reconnect requested before any target was set");
            return Err(ReconnectError::NoTarget);
        };
        if let Some(remaining) = self.reconnect_cooldown_remaining() {
            tracing::debug!(connection = %target, ?remaining, "reconnect throttled");
            self.notify(Notice::connection(
                NoticeKind::Info,
                "Please wait before reconnecting to the tool server",
            ));
            return Err(ReconnectError::TooSoon { remaining });
        }
        let Some(_gate) = self.acquire_gate() else {
            tracing::debug!(connection = %target, "reconnect rejected; attempt already in flight");
            self.notify(Notice::connection(
                NoticeKind::Info,
                "Already connecting to the tool server",
            ));
            return Err(ReconnectError::AlreadyConnecting);
        };

        let now = self.inner.clock.utc();
        self.with_state(|state| state.last_attempt_at = Some(now));
        self.notify(Notice::connection(
            NoticeKind::Loading,
            "Connecting to the tool server...",
        ));

        match self.run_series(target).await {
            SeriesOutcome::Connected => {
                self.notify(Notice::connection(
                    NoticeKind::Success,
                    "Connected to the tool server",
                ));
                Ok(())
            }
            SeriesOutcome::Exhausted => Err(ReconnectError::Failed),
            SeriesOutcome::Cancelled => {
                self.inner.notifier.dismiss(CONNECTION_NOTICE_SLOT);
                Err(ReconnectError::Failed)
            }
        }
    }

    /// Releases the connection held for `target`.
    ///
    /// When `target` is the current target, the health check is cancelled
    /// and local state is cleared; an in-flight series for it ends at its
    /// next check. Provider close failures are logged and swallowed.
    pub async fn teardown(&self, target: &ConnectionTarget) {
        self.with_state(|state| {
            if state.target.as_ref() == Some(target) {
                state.cancel_health_check();
                state.reset();
            }
        });

        match self.inner.provider.close_connection(target).await {
            Ok(()) => tracing::info!(connection = %target, "tool server connection closed"),
            Err(source) => {
                let err = TeardownError {
                    target: target.clone(),
                    source,
                };
                tracing::warn!(error = %err, "teardown failed");
            }
        }
    }

    /// Switches the tool server feature on or off.
    ///
    /// Disabling tears down the current target. Enabling does not connect;
    /// the caller decides when to connect.
    pub async fn set_enabled(&self, enabled: bool) {
        let previous = self.inner.enabled.swap(enabled, Ordering::AcqRel);
        if previous != enabled {
            tracing::info!(enabled, "tool server feature toggled");
        }
        if enabled {
            return;
        }
        if let Some(target) = self.target() {
            self.teardown(&target).await;
        } else {
            self.with_state(ConnectionState::cancel_health_check);
        }
    }

    /// Waits until no connect series is in flight.
    ///
    /// Returns immediately when the supervisor is idle. A series cancelled by
    /// [`Self::teardown`] or by disabling the feature ends after its current
    /// try or backoff sleep, so callers switching targets wait here before
    /// connecting again.
    pub async fn wait_until_idle(&self) {
        loop {
            let idle = self.inner.series_idle.notified();
            tokio::pin!(idle);
            idle.as_mut().enable();
            if !self.is_connecting() {
                return;
            }
            idle.await;
        }
    }

    /// Lists the tools of the connected server.
    ///
    /// # Errors
    ///
    /// Returns [`SupervisorError::NotConnected`] without a live connection
    /// and [`SupervisorError::ToolServer`] when the server call fails.
    pub async fn list_tools(&self) -> SupervisorResult<Vec<ToolDescriptor>> {
        let server = self.connected_server()?;
        Ok(server.list_tools().await?)
    }

    /// Executes `name` on the connected server.
    ///
    /// When `params` is a JSON object without a `target` key, the current
    /// target is added under `target`. Failures also raise an error notice
    /// in the tool execution slot.
    ///
    /// # Errors
    ///
    /// Returns [`SupervisorError::Domain`] for an empty tool name,
    /// [`SupervisorError::NotConnected`] without a live connection, and
    /// [`SupervisorError::ToolServer`] when the server call fails.
    pub async fn execute_tool(&self, name: &str, params: Value) -> SupervisorResult<ToolResult> {
        let tool_name = name.trim();
        if tool_name.is_empty() {
            return Err(ConnectionDomainError::EmptyToolName.into());
        }

        let outcome = self.execute_on_server(tool_name, params).await;
        if let Err(err) = &outcome {
            tracing::warn!(tool = tool_name, error = %err, "tool execution failed");
            self.notify(Notice::new(
                TOOL_EXECUTION_NOTICE_SLOT,
                NoticeKind::Error,
                format!("Failed to execute {}", tool_name.replace('_', " ")),
            ));
        }
        outcome
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.with_state(|state| state.status)
    }

    /// Returns the cumulative metrics.
    #[must_use]
    pub fn metrics(&self) -> ConnectionMetrics {
        self.with_state(|state| state.metrics)
    }

    /// Returns the retry counter of the current or last series.
    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.with_state(|state| state.attempt)
    }

    /// Returns whether the last series failed or a probe detected a drop.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.with_state(|state| state.has_error)
    }

    /// Returns whether a connect series is in flight.
    #[must_use]
    pub fn is_connecting(&self) -> bool {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    /// Returns the time of the last accepted reconnect.
    #[must_use]
    pub fn last_attempt_at(&self) -> Option<DateTime<Utc>> {
        self.with_state(|state| state.last_attempt_at)
    }

    /// Returns the current target.
    #[must_use]
    pub fn target(&self) -> Option<ConnectionTarget> {
        self.with_state(|state| state.target.clone())
    }

    /// Returns whether the tool server feature is on.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::Acquire)
    }

    /// Returns whether a server handle is held.
    #[must_use]
    pub fn has_server(&self) -> bool {
        self.with_state(|state| state.server.is_some())
    }

    /// Returns whether a health-check task is scheduled.
    #[must_use]
    pub fn is_health_check_active(&self) -> bool {
        self.with_state(|state| {
            state
                .health_check
                .as_ref()
                .is_some_and(|handle| !handle.is_finished())
        })
    }

    /// Returns a serialisable view of the supervisor state.
    #[must_use]
    pub fn snapshot(&self) -> ConnectionSnapshot {
        let is_connecting = self.is_connecting();
        self.with_state(|state| state.snapshot(is_connecting))
    }

    /// Returns the supervisor configuration.
    #[must_use]
    pub fn config(&self) -> &SupervisorConfig {
        &self.inner.config
    }

    async fn run_series(&self, target: ConnectionTarget) -> SeriesOutcome {
        if let Some(previous) = self.begin_series(&target) {
            self.close_superseded(&previous).await;
        }

        let backoff = self.inner.config.backoff();
        loop {
            let started = Instant::now();
            let err = match self.try_connect_once(&target).await {
                Ok(server) => return self.complete_success(&target, server, started.elapsed()),
                Err(err) => err,
            };

            let attempt = self.with_state(|state| {
                state.metrics.record_failure();
                state.attempt
            });
            if attempt.saturating_add(1) >= self.inner.config.max_retries {
                return self.complete_failure(&target, &err);
            }

            let delay = backoff.delay_for(attempt);
            tracing::warn!(
                connection = %target,
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "connect try failed; retrying"
            );
            tokio::time::sleep(delay).await;
            if !self.advance_attempt(&target) {
                tracing::debug!(connection = %target, "connect series cancelled");
                return SeriesOutcome::Cancelled;
            }
        }
    }

    /// Resets per-series state and returns a superseded target, if any.
    fn begin_series(&self, target: &ConnectionTarget) -> Option<ConnectionTarget> {
        tracing::info!(connection = %target, "connecting to tool server");
        self.with_state(|state| {
            state.cancel_health_check();
            state.server = None;
            state.transition(ConnectionStatus::Connecting);
            state.has_error = false;
            state.attempt = 0;
            state
                .target
                .replace(target.clone())
                .filter(|previous| previous != target)
        })
    }

    async fn close_superseded(&self, previous: &ConnectionTarget) {
        if let Err(source) = self.inner.provider.close_connection(previous).await {
            let err = TeardownError {
                target: previous.clone(),
                source,
            };
            tracing::warn!(error = %err, "closing superseded connection failed");
        }
    }

    async fn try_connect_once(
        &self,
        target: &ConnectionTarget,
    ) -> Result<Arc<P::Server>, ConnectError> {
        let timeout = self.inner.config.connection_timeout();
        let found = tokio::time::timeout(timeout, self.inner.provider.find_server(target))
            .await
            .map_err(|_elapsed| ConnectError::Timeout(timeout))?
            .map_err(ConnectError::Lookup)?;

        let server = match found {
            Some(server) => {
                if !server.is_connected() {
                    server.connect().await.map_err(ConnectError::ServerCreation)?;
                }
                server
            }
            None => {
                let created = self
                    .inner
                    .provider
                    .create_default_server(target)
                    .await
                    .map_err(ConnectError::ServerCreation)?;
                if !created.is_connected() {
                    return Err(ConnectError::ServerCreation(ToolServerError::NotConnected));
                }
                created
            }
        };

        let tools = server.list_tools().await.map_err(ConnectError::ToolListing)?;
        tracing::debug!(connection = %target, tool_count = tools.len(), "tool listing confirmed");
        Ok(server)
    }

    fn complete_success(
        &self,
        target: &ConnectionTarget,
        server: Arc<P::Server>,
        elapsed: Duration,
    ) -> SeriesOutcome {
        let enabled = self.is_enabled();
        let stored = self.with_state(|state| {
            if !enabled || state.target.as_ref() != Some(target) {
                return false;
            }
            state.metrics.record_success(elapsed);
            state.transition(ConnectionStatus::Connected);
            state.server = Some(Arc::clone(&server));
            state.attempt = 0;
            state.has_error = false;
            true
        });
        if !stored {
            tracing::debug!(connection = %target, "connected server discarded; series cancelled");
            return SeriesOutcome::Cancelled;
        }

        tracing::info!(
            connection = %target,
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "connected to tool server"
        );
        self.setup_health_check(server);
        SeriesOutcome::Connected
    }

    fn complete_failure(&self, target: &ConnectionTarget, err: &ConnectError) -> SeriesOutcome {
        let cooldown = self.inner.config.failure_notice_cooldown();
        let decision = self.with_state(|state| {
            if state.target.as_ref() != Some(target) {
                return None;
            }
            state.transition(ConnectionStatus::Error);
            state.has_error = true;
            state.server = None;
            let now = Instant::now();
            let notify = state
                .last_failure_notice
                .is_none_or(|last| now.duration_since(last) >= cooldown);
            if notify {
                state.last_failure_notice = Some(now);
            }
            Some(notify)
        });
        let Some(notify) = decision else {
            return SeriesOutcome::Cancelled;
        };

        tracing::warn!(
            connection = %target,
            attempts = self.inner.config.max_retries,
            error = %err,
            "connection attempts exhausted"
        );
        if notify {
            self.notify(Notice::connection(
                NoticeKind::Error,
                format!("Could not connect to the tool server: {err}"),
            ));
        } else {
            tracing::debug!(connection = %target, "failure notice suppressed by cooldown");
            self.inner.notifier.dismiss(CONNECTION_NOTICE_SLOT);
        }
        SeriesOutcome::Exhausted
    }

    fn acquire_gate(&self) -> Option<InFlightGuard<'_>> {
        InFlightGuard::acquire(&self.inner.in_flight, &self.inner.series_idle)
    }

    /// Counts one retried try; returns `false` when the series was cancelled
    /// during the backoff sleep.
    fn advance_attempt(&self, target: &ConnectionTarget) -> bool {
        let enabled = self.is_enabled();
        self.with_state(|state| {
            if !enabled || state.target.as_ref() != Some(target) {
                return false;
            }
            state.attempt = state.attempt.saturating_add(1);
            true
        })
    }

    fn reconnect_cooldown_remaining(&self) -> Option<Duration> {
        let last = self.last_attempt_at()?;
        let interval = TimeDelta::from_std(self.inner.config.min_reconnect_interval())
            .unwrap_or(TimeDelta::MAX);
        let elapsed = self.inner.clock.utc().signed_duration_since(last);
        let remaining = interval.checked_sub(&elapsed)?;
        (remaining > TimeDelta::zero()).then(|| remaining.to_std().unwrap_or_default())
    }

    async fn execute_on_server(
        &self,
        tool_name: &str,
        params: Value,
    ) -> SupervisorResult<ToolResult> {
        let server = self.connected_server()?;
        let request = self.with_target_injected(params);
        Ok(server.execute_tool(tool_name, request).await?)
    }

    fn with_target_injected(&self, params: Value) -> Value {
        let Some(target) = self.target() else {
            return params;
        };
        match params {
            Value::Object(mut fields) => {
                fields
                    .entry("target")
                    .or_insert_with(|| Value::String(target.as_str().to_owned()));
                Value::Object(fields)
            }
            other => other,
        }
    }

    fn connected_server(&self) -> SupervisorResult<Arc<P::Server>> {
        self.with_state(|state| {
            state
                .server
                .clone()
                .filter(|_| state.status.holds_server())
        })
        .ok_or(SupervisorError::NotConnected)
    }

    fn notify(&self, notice: Notice) {
        self.inner.notifier.show(notice);
    }

    fn with_state<T>(&self, apply: impl FnOnce(&mut ConnectionState<P::Server>) -> T) -> T {
        let mut state = self
            .inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        apply(&mut state)
    }
}
