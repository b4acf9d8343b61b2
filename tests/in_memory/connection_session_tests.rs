//! Connection session behaviour with file-backed preferences.

use super::helpers::{ManualClock, target};
use camino::Utf8PathBuf;
use rstest::{fixture, rstest};
use std::sync::Arc;
use tempfile::TempDir;
use tool_link::connection::{
    adapters::{
        JsonFilePreferenceStore, RecordingNotifier,
        memory::{InMemoryToolServer, InMemoryToolServerProvider},
    },
    domain::{ConnectionStatus, SupervisorConfig},
    services::{ConnectionSession, ConnectionSupervisor, ToolServerPreference},
};

type FileSession = ConnectionSession<
    InMemoryToolServerProvider,
    RecordingNotifier,
    ManualClock,
    JsonFilePreferenceStore,
>;

struct SessionContext {
    _temp: TempDir,
    dir: Utf8PathBuf,
    provider: Arc<InMemoryToolServerProvider>,
}

impl SessionContext {
    fn session(&self) -> FileSession {
        let store = JsonFilePreferenceStore::open(&self.dir, "preferences.json")
            .expect("preference dir should open");
        let supervisor = ConnectionSupervisor::new(
            self.provider.clone(),
            Arc::new(RecordingNotifier::new()),
            Arc::new(ManualClock::new()),
            SupervisorConfig::default(),
        );
        ConnectionSession::new(supervisor, ToolServerPreference::new(Arc::new(store)))
    }
}

#[fixture]
fn context() -> SessionContext {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let dir =
        Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("temp path should be UTF-8");
    SessionContext {
        _temp: temp,
        dir,
        provider: Arc::new(InMemoryToolServerProvider::new()),
    }
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn fresh_session_defaults_to_enabled_and_connects(context: SessionContext) {
    let session = context.session();

    assert!(session.start().await);
    assert!(session.select_target(target("proj-1")).await);

    assert_eq!(
        session.supervisor().status(),
        ConnectionStatus::Connected
    );
    assert_eq!(session.selected_target(), Some(target("proj-1")));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn disabled_flag_survives_restart(context: SessionContext) {
    let first = context.session();
    first.start().await;
    assert!(first.select_target(target("proj-1")).await);
    let connected = first.set_enabled(false).await.expect("flag should persist");
    assert!(!connected);
    first.shutdown().await;

    let second = context.session();
    assert!(!second.start().await);
    assert!(!second.select_target(target("proj-1")).await);

    assert_eq!(
        second.supervisor().status(),
        ConnectionStatus::Disconnected
    );
    assert_eq!(context.provider.lookup_count(), 1);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn enabling_connects_selected_target(context: SessionContext) {
    let session = context.session();
    session.set_enabled(false).await.expect("flag should persist");
    assert!(!session.select_target(target("proj-1")).await);

    let connected = session.set_enabled(true).await.expect("flag should persist");

    assert!(connected);
    assert!(session.supervisor().is_health_check_active());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn changing_target_closes_previous_connection(context: SessionContext) {
    context
        .provider
        .insert_server(target("proj-1"), Arc::new(InMemoryToolServer::connected()))
        .expect("insert should succeed");
    let session = context.session();
    session.start().await;
    assert!(session.select_target(target("proj-1")).await);

    assert!(session.select_target(target("proj-2")).await);

    assert_eq!(context.provider.close_count(), 1);
    assert!(
        context
            .provider
            .server(&target("proj-1"))
            .expect("provider readable")
            .is_none()
    );
    assert_eq!(session.supervisor().target(), Some(target("proj-2")));
}
