//! In-memory tool server handle for supervisor tests.

use crate::connection::{
    domain::{ToolDescriptor, ToolResult},
    ports::{ToolServerError, ToolServerHandle, ToolServerResult},
};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::{Arc, RwLock};

/// Scriptable in-memory tool server.
///
/// The server models connection state, liveness, and a tool catalog without
/// any transport. Invocations are recorded and echoed back, which makes the
/// adapter suitable for unit and integration tests and for local
/// deterministic flows.
#[derive(Debug, Clone, Default)]
pub struct InMemoryToolServer {
    state: Arc<RwLock<InMemoryServerState>>,
}

#[derive(Debug, Default)]
struct InMemoryServerState {
    connected: bool,
    inactive: bool,
    connect_error: Option<String>,
    list_tools_error: Option<String>,
    tools: Vec<ToolDescriptor>,
    invocations: Vec<(String, Value)>,
}

impl InMemoryToolServer {
    /// Creates a disconnected server with an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a server that already reports an established connection.
    #[must_use]
    pub fn connected() -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryServerState {
                connected: true,
                ..InMemoryServerState::default()
            })),
        }
    }

    /// Replaces the tool catalog.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn set_tools(&self, tools: Vec<ToolDescriptor>) -> ToolServerResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| ToolServerError::message(err.to_string()))?;
        state.tools = tools;
        Ok(())
    }

    /// Makes subsequent liveness probes report a dropped connection.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn set_inactive(&self, inactive: bool) -> ToolServerResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| ToolServerError::message(err.to_string()))?;
        state.inactive = inactive;
        Ok(())
    }

    /// Makes subsequent `connect` calls fail with `message`.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn fail_connect(&self, message: impl Into<String>) -> ToolServerResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| ToolServerError::message(err.to_string()))?;
        state.connect_error = Some(message.into());
        Ok(())
    }

    /// Makes subsequent `list_tools` calls fail with `message`.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn fail_list_tools(&self, message: impl Into<String>) -> ToolServerResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| ToolServerError::message(err.to_string()))?;
        state.list_tools_error = Some(message.into());
        Ok(())
    }

    /// Returns every recorded invocation as `(tool name, params)`.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn invocations(&self) -> ToolServerResult<Vec<(String, Value)>> {
        let state = self
            .state
            .read()
            .map_err(|err| ToolServerError::message(err.to_string()))?;
        Ok(state.invocations.clone())
    }
}

#[async_trait]
impl ToolServerHandle for InMemoryToolServer {
    async fn connect(&self) -> ToolServerResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| ToolServerError::message(err.to_string()))?;
        if let Some(message) = state.connect_error.clone() {
            state.connected = false;
            return Err(ToolServerError::message(message));
        }
        state.connected = true;
        state.inactive = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state.read().is_ok_and(|state| state.connected)
    }

    fn is_connection_active(&self) -> bool {
        self.state
            .read()
            .is_ok_and(|state| state.connected && !state.inactive)
    }

    async fn list_tools(&self) -> ToolServerResult<Vec<ToolDescriptor>> {
        let state = self
            .state
            .read()
            .map_err(|err| ToolServerError::message(err.to_string()))?;
        if !state.connected {
            return Err(ToolServerError::NotConnected);
        }
        if let Some(message) = state.list_tools_error.clone() {
            return Err(ToolServerError::message(message));
        }
        Ok(state.tools.clone())
    }

    async fn execute_tool(&self, name: &str, params: Value) -> ToolServerResult<ToolResult> {
        let mut state = self
            .state
            .write()
            .map_err(|err| ToolServerError::message(err.to_string()))?;
        if !state.connected {
            return Err(ToolServerError::NotConnected);
        }
        if !state.tools.iter().any(|tool| tool.name() == name) {
            return Err(ToolServerError::UnknownTool(name.to_owned()));
        }
        state.invocations.push((name.to_owned(), params.clone()));
        Ok(ToolResult::success(json!({ "tool": name, "params": params })))
    }
}
