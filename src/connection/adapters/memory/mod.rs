//! In-memory adapters for tool servers and preferences.

mod preference;
mod provider;
mod server;

pub use preference::InMemoryPreferenceStore;
pub use provider::{CreateBehaviour, InMemoryToolServerProvider};
pub use server::InMemoryToolServer;
