//! Adapter implementations for tool server, notification, and preference
//! ports.

pub mod memory;

mod file;
mod notifier;

pub use file::JsonFilePreferenceStore;
pub use notifier::{NoticeEvent, RecordingNotifier, TracingNotifier};
