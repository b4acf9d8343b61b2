//! User notification port.

use crate::connection::domain::Notice;

/// Sink for toast-style user notices.
///
/// Delivery is fire-and-forget: the supervisor never waits on or observes
/// the outcome of a notification.
pub trait Notifier: Send + Sync {
    /// Shows `notice`, replacing whatever currently occupies its slot.
    fn show(&self, notice: Notice);

    /// Removes whatever currently occupies `slot`.
    fn dismiss(&self, slot: &str);
}
