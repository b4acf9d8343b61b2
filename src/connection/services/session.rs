//! Composition-level owner of a supervisor and its feature flag.

use super::{ConnectionSupervisor, ToolServerPreference};
use crate::connection::{
    domain::{ConnectionStatus, ConnectionTarget},
    ports::{Notifier, PreferenceResult, PreferenceStore, ToolServerProvider},
};
use mockable::Clock;
use std::sync::{Mutex, PoisonError};

/// Ties target selection and the persisted feature flag to a supervisor.
///
/// The session decides when to connect and tear down: on target changes,
/// on flag changes, and on shutdown.
pub struct ConnectionSession<P, N, C, S>
where
    P: ToolServerProvider + 'static,
    N: Notifier + 'static,
    C: Clock + Send + Sync + 'static,
    S: PreferenceStore,
{
    supervisor: ConnectionSupervisor<P, N, C>,
    preference: ToolServerPreference<S>,
    selected: Mutex<Option<ConnectionTarget>>,
}

impl<P, N, C, S> ConnectionSession<P, N, C, S>
where
    P: ToolServerProvider + 'static,
    N: Notifier + 'static,
    C: Clock + Send + Sync + 'static,
    S: PreferenceStore,
{
    /// Creates a session with no selected target.
    #[must_use]
    pub const fn new(
        supervisor: ConnectionSupervisor<P, N, C>,
        preference: ToolServerPreference<S>,
    ) -> Self {
        Self {
            supervisor,
            preference,
            selected: Mutex::new(None),
        }
    }

    /// Applies the persisted flag to the supervisor and returns it.
    pub async fn start(&self) -> bool {
        let enabled = self.preference.load().await;
        self.supervisor.set_enabled(enabled).await;
        tracing::debug!(enabled, "connection session started");
        enabled
    }

    /// Selects `target`, tearing down a previously selected one, and
    /// connects when the feature is on.
    ///
    /// A series still running for the previous target is cancelled and
    /// awaited before the new target connects. Re-selecting the connected
    /// target is a no-op returning `true`.
    pub async fn select_target(&self, target: ConnectionTarget) -> bool {
        let previous = self
            .selected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(target.clone());

        match previous {
            Some(old) if old != target => {
                self.supervisor.teardown(&old).await;
                self.supervisor.wait_until_idle().await;
            }
            Some(_) if self.supervisor.status() == ConnectionStatus::Connected => return true,
            Some(_) | None => {}
        }

        if !self.supervisor.is_enabled() {
            tracing::debug!(connection = %target, "target selected; tool server disabled");
            return false;
        }
        self.supervisor.connect(target).await
    }

    /// Persists the flag and applies it.
    ///
    /// Switching on connects the selected target; switching off tears it
    /// down. Returns whether the supervisor is connected afterwards.
    ///
    /// # Errors
    ///
    /// Returns the preference store error when the flag cannot be persisted;
    /// the supervisor is left untouched in that case.
    pub async fn set_enabled(&self, enabled: bool) -> PreferenceResult<bool> {
        self.preference.store(enabled).await?;
        self.supervisor.set_enabled(enabled).await;

        if enabled
            && self.supervisor.status() != ConnectionStatus::Connected
            && let Some(target) = self.selected_target()
        {
            self.supervisor.connect(target).await;
        }
        Ok(self.supervisor.status() == ConnectionStatus::Connected)
    }

    /// Tears down the selected target and forgets it.
    pub async fn shutdown(&self) {
        let selected = self
            .selected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(target) = selected {
            self.supervisor.teardown(&target).await;
        }
    }

    /// Returns the selected target.
    #[must_use]
    pub fn selected_target(&self) -> Option<ConnectionTarget> {
        self.selected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the supervised connection.
    #[must_use]
    pub const fn supervisor(&self) -> &ConnectionSupervisor<P, N, C> {
        &self.supervisor
    }
}
