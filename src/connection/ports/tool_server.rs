//! Tool server ports consumed by the connection supervisor.

use crate::connection::domain::{ConnectionTarget, ToolDescriptor, ToolResult};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Result type for tool server operations.
pub type ToolServerResult<T> = Result<T, ToolServerError>;

/// Handle to one tool server connection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ToolServerHandle: Send + Sync {
    /// Establishes the underlying connection.
    async fn connect(&self) -> ToolServerResult<()>;

    /// Returns whether the handle reports an established connection.
    fn is_connected(&self) -> bool;

    /// Returns whether the connection is still live.
    ///
    /// This is the probe used by periodic health checks; it may be stricter
    /// than [`Self::is_connected`], for example by considering idle time.
    fn is_connection_active(&self) -> bool;

    /// Lists the tools the server exposes.
    async fn list_tools(&self) -> ToolServerResult<Vec<ToolDescriptor>>;

    /// Invokes a tool by name.
    async fn execute_tool(&self, name: &str, params: Value) -> ToolServerResult<ToolResult>;
}

/// Directory of tool servers keyed by connection target.
#[async_trait]
pub trait ToolServerProvider: Send + Sync {
    /// Concrete server handle type.
    type Server: ToolServerHandle + 'static;

    /// Looks up an existing server for `target`.
    async fn find_server(
        &self,
        target: &ConnectionTarget,
    ) -> ToolServerResult<Option<Arc<Self::Server>>>;

    /// Creates the default server for `target`.
    async fn create_default_server(
        &self,
        target: &ConnectionTarget,
    ) -> ToolServerResult<Arc<Self::Server>>;

    /// Closes any connection held for `target`.
    async fn close_connection(&self, target: &ConnectionTarget) -> ToolServerResult<()>;
}

/// Errors returned by tool server adapters.
#[derive(Debug, Clone, Error)]
pub enum ToolServerError {
    /// The server connection is not established.
    #[error("tool server is not connected")]
    NotConnected,

    /// The server does not expose the requested tool.
    #[error("tool server does not expose tool '{0}'")]
    UnknownTool(String),

    /// Generic runtime failure.
    #[error("tool server runtime error: {0}")]
    Runtime(Arc<dyn std::error::Error + Send + Sync>),
}

impl ToolServerError {
    /// Wraps a runtime error from the adapter.
    pub fn runtime(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Runtime(Arc::new(err))
    }

    /// Wraps a plain runtime message.
    pub fn message(message: impl Into<String>) -> Self {
        Self::runtime(std::io::Error::other(message.into()))
    }
}
