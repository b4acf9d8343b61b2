//! Shared test helpers for in-memory connection integration tests.

use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;
use rstest::fixture;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tool_link::connection::{
    adapters::{
        RecordingNotifier,
        memory::{InMemoryToolServer, InMemoryToolServerProvider},
    },
    domain::{ConnectionTarget, SupervisorConfig},
    services::ConnectionSupervisor,
};

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a clock frozen at a fixed instant.
    #[must_use]
    pub fn new() -> Self {
        let start = DateTime::parse_from_rfc3339("2026-03-01T09:00:00Z")
            .expect("valid timestamp")
            .with_timezone(&Utc);
        Self {
            now: Mutex::new(start),
        }
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += TimeDelta::from_std(by).expect("duration fits");
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Supervisor wired to in-memory adapters.
pub type TestSupervisor =
    ConnectionSupervisor<InMemoryToolServerProvider, RecordingNotifier, ManualClock>;

/// Supervisor plus handles on every adapter it uses.
pub struct SupervisorContext {
    /// Scriptable provider.
    pub provider: Arc<InMemoryToolServerProvider>,
    /// Recorded notices.
    pub notifier: Arc<RecordingNotifier>,
    /// Wall clock used for reconnect throttling.
    pub clock: Arc<ManualClock>,
    /// Supervisor under test.
    pub supervisor: TestSupervisor,
}

impl SupervisorContext {
    /// Builds a context around `config`.
    #[must_use]
    pub fn with_config(config: SupervisorConfig) -> Self {
        let provider = Arc::new(InMemoryToolServerProvider::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let clock = Arc::new(ManualClock::new());
        let supervisor =
            ConnectionSupervisor::new(provider.clone(), notifier.clone(), clock.clone(), config);
        Self {
            provider,
            notifier,
            clock,
            supervisor,
        }
    }

    /// Registers an already connected server for `target`.
    pub fn register_connected_server(&self, target: &ConnectionTarget) -> Arc<InMemoryToolServer> {
        let server = Arc::new(InMemoryToolServer::connected());
        self.provider
            .insert_server(target.clone(), server.clone())
            .expect("insert should succeed");
        server
    }
}

/// Provides a supervisor with default configuration.
#[fixture]
pub fn context() -> SupervisorContext {
    SupervisorContext::with_config(SupervisorConfig::default())
}

/// Builds a validated target.
#[must_use]
pub fn target(value: &str) -> ConnectionTarget {
    ConnectionTarget::new(value).expect("valid target")
}
