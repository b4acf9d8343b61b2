//! User-facing notices emitted by the supervisor.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Slot shared by all connection notices, so each replaces the previous one.
pub const CONNECTION_NOTICE_SLOT: &str = "tool-server-connection";

/// Slot used for tool execution failures.
pub const TOOL_EXECUTION_NOTICE_SLOT: &str = "tool-execution";

/// Presentation class of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// Transient progress indicator.
    Loading,
    /// Operation completed.
    Success,
    /// Operation failed.
    Error,
    /// Informational, not a failure.
    Info,
}

impl NoticeKind {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A toast-style message addressed to a replaceable slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    slot: String,
    kind: NoticeKind,
    message: String,
}

impl Notice {
    /// Creates a notice in `slot`.
    #[must_use]
    pub fn new(slot: impl Into<String>, kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            slot: slot.into(),
            kind,
            message: message.into(),
        }
    }

    /// Creates a notice in the connection slot.
    #[must_use]
    pub fn connection(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self::new(CONNECTION_NOTICE_SLOT, kind, message)
    }

    /// Returns the slot this notice replaces.
    #[must_use]
    pub fn slot(&self) -> &str {
        &self.slot
    }

    /// Returns the notice kind.
    #[must_use]
    pub const fn kind(&self) -> NoticeKind {
        self.kind
    }

    /// Returns the message text.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}
