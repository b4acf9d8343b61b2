//! Tool metadata and invocation results exchanged with a tool server.

use super::ConnectionDomainError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata for one tool a server exposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    name: String,
    description: String,
    input_schema: Value,
}

impl ToolDescriptor {
    /// Creates a tool descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionDomainError::EmptyToolName`] when the name is empty
    /// after trimming.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
    ) -> Result<Self, ConnectionDomainError> {
        let normalized_name = name.into().trim().to_owned();
        if normalized_name.is_empty() {
            return Err(ConnectionDomainError::EmptyToolName);
        }

        Ok(Self {
            name: normalized_name,
            description: description.into().trim().to_owned(),
            input_schema,
        })
    }

    /// Returns the tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the tool description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the JSON schema for the tool parameters.
    #[must_use]
    pub const fn input_schema(&self) -> &Value {
        &self.input_schema
    }
}

/// Outcome of a tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    content: Value,
    is_error: bool,
}

impl ToolResult {
    /// Creates a successful result.
    #[must_use]
    pub const fn success(content: Value) -> Self {
        Self {
            content,
            is_error: false,
        }
    }

    /// Creates a result the server flagged as a tool-level failure.
    #[must_use]
    pub const fn failure(content: Value) -> Self {
        Self {
            content,
            is_error: true,
        }
    }

    /// Returns the result payload.
    #[must_use]
    pub const fn content(&self) -> &Value {
        &self.content
    }

    /// Returns whether the server reported a tool-level failure.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.is_error
    }
}
