//! In-memory tool server provider for supervisor tests.

use super::InMemoryToolServer;
use crate::connection::{
    domain::ConnectionTarget,
    ports::{ToolServerError, ToolServerProvider, ToolServerResult},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::time::Instant;

/// How newly created default servers behave.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CreateBehaviour {
    /// Created servers are connected and registered for later lookups.
    #[default]
    Connected,
    /// Created servers are returned but report not connected.
    Disconnected,
    /// Creation fails with the given message.
    Fail(String),
}

/// Scriptable in-memory provider of [`InMemoryToolServer`] handles.
///
/// Lookups may be delayed or made to fail, server creation can be scripted
/// through [`CreateBehaviour`], and every call is counted so tests can
/// assert exactly how often the supervisor contacted the provider.
#[derive(Debug, Clone, Default)]
pub struct InMemoryToolServerProvider {
    state: Arc<RwLock<InMemoryProviderState>>,
    counters: Arc<ProviderCounters>,
}

#[derive(Debug, Default)]
struct InMemoryProviderState {
    servers: HashMap<ConnectionTarget, Arc<InMemoryToolServer>>,
    lookup_delay: Duration,
    lookup_error: Option<String>,
    create_behaviour: CreateBehaviour,
    close_error: Option<String>,
    lookup_instants: Vec<Instant>,
}

#[derive(Debug, Default)]
struct ProviderCounters {
    lookups: AtomicUsize,
    creates: AtomicUsize,
    closes: AtomicUsize,
}

impl InMemoryToolServerProvider {
    /// Creates an empty provider whose default servers connect.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `server` as the existing server for `target`.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn insert_server(
        &self,
        target: ConnectionTarget,
        server: Arc<InMemoryToolServer>,
    ) -> ToolServerResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| ToolServerError::message(err.to_string()))?;
        state.servers.insert(target, server);
        Ok(())
    }

    /// Returns the server registered for `target`, if any.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn server(
        &self,
        target: &ConnectionTarget,
    ) -> ToolServerResult<Option<Arc<InMemoryToolServer>>> {
        let state = self
            .state
            .read()
            .map_err(|err| ToolServerError::message(err.to_string()))?;
        Ok(state.servers.get(target).cloned())
    }

    /// Delays every lookup by `delay`.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn set_lookup_delay(&self, delay: Duration) -> ToolServerResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| ToolServerError::message(err.to_string()))?;
        state.lookup_delay = delay;
        Ok(())
    }

    /// Makes every lookup fail with `message`, or restores lookups with
    /// `None`.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn set_lookup_error(&self, message: Option<String>) -> ToolServerResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| ToolServerError::message(err.to_string()))?;
        state.lookup_error = message;
        Ok(())
    }

    /// Sets how default servers are created.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn set_create_behaviour(&self, behaviour: CreateBehaviour) -> ToolServerResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| ToolServerError::message(err.to_string()))?;
        state.create_behaviour = behaviour;
        Ok(())
    }

    /// Makes every `close_connection` call fail with `message`.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn fail_close(&self, message: impl Into<String>) -> ToolServerResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| ToolServerError::message(err.to_string()))?;
        state.close_error = Some(message.into());
        Ok(())
    }

    /// Returns how many lookups were made.
    #[must_use]
    pub fn lookup_count(&self) -> usize {
        self.counters.lookups.load(Ordering::SeqCst)
    }

    /// Returns how many default servers were requested.
    #[must_use]
    pub fn create_count(&self) -> usize {
        self.counters.creates.load(Ordering::SeqCst)
    }

    /// Returns how many close requests were made.
    #[must_use]
    pub fn close_count(&self) -> usize {
        self.counters.closes.load(Ordering::SeqCst)
    }

    /// Returns the instant at which each lookup started, in order.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn lookup_instants(&self) -> ToolServerResult<Vec<Instant>> {
        let state = self
            .state
            .read()
            .map_err(|err| ToolServerError::message(err.to_string()))?;
        Ok(state.lookup_instants.clone())
    }

    fn begin_lookup(&self) -> ToolServerResult<Duration> {
        self.counters.lookups.fetch_add(1, Ordering::SeqCst);
        let mut state = self
            .state
            .write()
            .map_err(|err| ToolServerError::message(err.to_string()))?;
        state.lookup_instants.push(Instant::now());
        Ok(state.lookup_delay)
    }
}

#[async_trait]
impl ToolServerProvider for InMemoryToolServerProvider {
    type Server = InMemoryToolServer;

    async fn find_server(
        &self,
        target: &ConnectionTarget,
    ) -> ToolServerResult<Option<Arc<InMemoryToolServer>>> {
        let delay = self.begin_lookup()?;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let state = self
            .state
            .read()
            .map_err(|err| ToolServerError::message(err.to_string()))?;
        if let Some(message) = state.lookup_error.clone() {
            return Err(ToolServerError::message(message));
        }
        Ok(state.servers.get(target).cloned())
    }

    async fn create_default_server(
        &self,
        target: &ConnectionTarget,
    ) -> ToolServerResult<Arc<InMemoryToolServer>> {
        self.counters.creates.fetch_add(1, Ordering::SeqCst);
        let mut state = self
            .state
            .write()
            .map_err(|err| ToolServerError::message(err.to_string()))?;

        match state.create_behaviour.clone() {
            CreateBehaviour::Connected => {
                let server = Arc::new(InMemoryToolServer::connected());
                state.servers.insert(target.clone(), server.clone());
                Ok(server)
            }
            CreateBehaviour::Disconnected => Ok(Arc::new(InMemoryToolServer::new())),
            CreateBehaviour::Fail(message) => Err(ToolServerError::message(message)),
        }
    }

    async fn close_connection(&self, target: &ConnectionTarget) -> ToolServerResult<()> {
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
        let mut state = self
            .state
            .write()
            .map_err(|err| ToolServerError::message(err.to_string()))?;
        if let Some(message) = state.close_error.clone() {
            return Err(ToolServerError::message(message));
        }
        state.servers.remove(target);
        Ok(())
    }
}
