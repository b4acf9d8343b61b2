//! Port contracts for supervised tool-server connections.

mod notifier;
mod preference;
mod tool_server;

pub use notifier::Notifier;
pub use preference::{PreferenceError, PreferenceResult, PreferenceStore};
#[cfg(test)]
pub use tool_server::MockToolServerHandle;
pub use tool_server::{ToolServerError, ToolServerHandle, ToolServerProvider, ToolServerResult};
