//! Application services for supervised tool-server connections.

mod preference;
mod session;
mod supervisor;

pub use preference::{ToolServerPreference, USE_TOOL_SERVER_KEY};
pub use session::ConnectionSession;
pub use supervisor::{
    ConnectError, ConnectionSupervisor, ReconnectError, SupervisorError, SupervisorResult,
    TeardownError,
};
