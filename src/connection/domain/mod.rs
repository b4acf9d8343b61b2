//! Domain model for supervised tool-server connections.
//!
//! The connection domain models the target a connection is scoped to, the
//! connection status state machine, cumulative metrics, the retry backoff
//! policy, supervisor tunables, and the tool metadata exchanged with a
//! server. Infrastructure concerns remain outside this boundary.

mod backoff;
mod config;
mod error;
mod metrics;
mod notice;
mod snapshot;
mod status;
mod target;
mod tool;

pub use backoff::BackoffPolicy;
pub use config::{ConfigError, SupervisorConfig};
pub use error::{ConnectionDomainError, ParseConnectionStatusError};
pub use metrics::ConnectionMetrics;
pub use notice::{CONNECTION_NOTICE_SLOT, Notice, NoticeKind, TOOL_EXECUTION_NOTICE_SLOT};
pub use snapshot::ConnectionSnapshot;
pub use status::ConnectionStatus;
pub use target::ConnectionTarget;
pub use tool::{ToolDescriptor, ToolResult};
