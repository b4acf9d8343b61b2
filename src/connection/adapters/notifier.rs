//! Notifier adapters.

use crate::connection::{
    domain::{Notice, NoticeKind},
    ports::Notifier,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// One recorded notifier call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoticeEvent {
    /// A notice was shown.
    Shown(Notice),
    /// A slot was dismissed.
    Dismissed(String),
}

/// Notifier that records every call, for tests and status displays.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    state: Arc<Mutex<RecordingState>>,
}

#[derive(Debug, Default)]
struct RecordingState {
    events: Vec<NoticeEvent>,
    visible: HashMap<String, Notice>,
}

impl RecordingNotifier {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every recorded call in order.
    #[must_use]
    pub fn events(&self) -> Vec<NoticeEvent> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .events
            .clone()
    }

    /// Returns every shown notice of `kind`, in order.
    #[must_use]
    pub fn shown_of_kind(&self, kind: NoticeKind) -> Vec<Notice> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                NoticeEvent::Shown(notice) if notice.kind() == kind => Some(notice),
                NoticeEvent::Shown(_) | NoticeEvent::Dismissed(_) => None,
            })
            .collect()
    }

    /// Returns the notice currently occupying `slot`.
    #[must_use]
    pub fn visible(&self, slot: &str) -> Option<Notice> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .visible
            .get(slot)
            .cloned()
    }
}

impl Notifier for RecordingNotifier {
    fn show(&self, notice: Notice) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state
            .visible
            .insert(notice.slot().to_owned(), notice.clone());
        state.events.push(NoticeEvent::Shown(notice));
    }

    fn dismiss(&self, slot: &str) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.visible.remove(slot);
        state.events.push(NoticeEvent::Dismissed(slot.to_owned()));
    }
}

/// Notifier that turns notices into `tracing` events.
///
/// Suitable for headless deployments where there is no toast surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn show(&self, notice: Notice) {
        match notice.kind() {
            NoticeKind::Error => {
                tracing::error!(slot = notice.slot(), "{}", notice.message());
            }
            NoticeKind::Loading | NoticeKind::Success | NoticeKind::Info => {
                tracing::info!(slot = notice.slot(), kind = %notice.kind(), "{}", notice.message());
            }
        }
    }

    fn dismiss(&self, slot: &str) {
        tracing::debug!(slot, "notice dismissed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::domain::CONNECTION_NOTICE_SLOT;

    #[test]
    fn later_notice_replaces_slot() {
        let notifier = RecordingNotifier::new();
        notifier.show(Notice::connection(NoticeKind::Loading, "Connecting"));
        notifier.show(Notice::connection(NoticeKind::Success, "Connected"));

        let visible = notifier
            .visible(CONNECTION_NOTICE_SLOT)
            .expect("slot should be occupied");
        assert_eq!(visible.kind(), NoticeKind::Success);
        assert_eq!(notifier.events().len(), 2);
    }

    #[test]
    fn dismiss_clears_slot() {
        let notifier = RecordingNotifier::new();
        notifier.show(Notice::connection(NoticeKind::Loading, "Connecting"));
        notifier.dismiss(CONNECTION_NOTICE_SLOT);

        assert!(notifier.visible(CONNECTION_NOTICE_SLOT).is_none());
        assert_eq!(
            notifier.events().last(),
            Some(&NoticeEvent::Dismissed(CONNECTION_NOTICE_SLOT.to_owned()))
        );
    }
}
