//! Connection supervisor behaviour against in-memory adapters.

use super::helpers::{SupervisorContext, context, target};
use rstest::rstest;
use serde_json::json;
use std::time::Duration;
use tool_link::connection::{
    adapters::NoticeEvent,
    domain::{
        CONNECTION_NOTICE_SLOT, ConnectionStatus, NoticeKind, SupervisorConfig, ToolDescriptor,
    },
    ports::ToolServerHandle,
    services::{ReconnectError, SupervisorError},
};

fn failing_context(config: SupervisorConfig) -> SupervisorContext {
    let context = SupervisorContext::with_config(config);
    context
        .provider
        .set_lookup_error(Some("connection refused".to_owned()))
        .expect("knob should apply");
    context
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn preconnected_server_connects_on_first_attempt(context: SupervisorContext) {
    context.register_connected_server(&target("proj-1"));

    assert!(context.supervisor.connect(target("proj-1")).await);

    let snapshot = context.supervisor.snapshot();
    assert_eq!(snapshot.status, ConnectionStatus::Connected);
    assert_eq!(snapshot.attempt, 0);
    assert_eq!(snapshot.metrics.success_count(), 1);
    assert_eq!(snapshot.metrics.failure_count(), 0);
    assert!(context.supervisor.is_health_check_active());
    assert_eq!(context.provider.lookup_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn unreachable_target_exhausts_retries_with_doubling_backoff() {
    let context = failing_context(SupervisorConfig {
        initial_backoff_ms: 100,
        max_retries: 3,
        ..SupervisorConfig::default()
    });

    assert!(!context.supervisor.connect(target("proj-2")).await);

    let instants = context
        .provider
        .lookup_instants()
        .expect("instants readable");
    let gaps: Vec<Duration> = instants
        .iter()
        .zip(instants.iter().skip(1))
        .map(|(earlier, later)| later.duration_since(*earlier))
        .collect();
    assert_eq!(
        gaps,
        vec![Duration::from_millis(100), Duration::from_millis(200)]
    );
    assert_eq!(context.supervisor.status(), ConnectionStatus::Error);
    assert_eq!(context.supervisor.metrics().failure_count(), 3);
    assert!(context.supervisor.has_error());
    let notice = context
        .notifier
        .visible(CONNECTION_NOTICE_SLOT)
        .expect("failure notice shown");
    assert_eq!(notice.kind(), NoticeKind::Error);
}

#[tokio::test(start_paused = true)]
async fn backoff_is_capped_at_max() {
    let context = failing_context(SupervisorConfig {
        initial_backoff_ms: 100,
        max_backoff_ms: 300,
        max_retries: 6,
        ..SupervisorConfig::default()
    });

    assert!(!context.supervisor.connect(target("proj-2")).await);

    let instants = context
        .provider
        .lookup_instants()
        .expect("instants readable");
    let gaps: Vec<u128> = instants
        .iter()
        .zip(instants.iter().skip(1))
        .map(|(earlier, later)| later.duration_since(*earlier).as_millis())
        .collect();
    assert_eq!(gaps, vec![100, 200, 300, 300, 300]);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn reconnect_twice_within_interval_contacts_server_once(context: SupervisorContext) {
    context.register_connected_server(&target("proj-1"));
    assert!(context.supervisor.connect(target("proj-1")).await);
    let lookups_before = context.provider.lookup_count();

    let first = context.supervisor.reconnect().await;
    let second = context.supervisor.try_reconnect().await;

    assert!(first);
    assert!(matches!(second, Err(ReconnectError::TooSoon { .. })));
    assert_eq!(context.provider.lookup_count(), lookups_before + 1);
    assert_eq!(context.supervisor.metrics().failure_count(), 0);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn reconnect_is_accepted_again_after_interval(context: SupervisorContext) {
    assert!(context.supervisor.connect(target("proj-1")).await);
    assert!(context.supervisor.reconnect().await);

    context.clock.advance(Duration::from_millis(
        SupervisorConfig::default().min_reconnect_interval_ms,
    ));

    assert!(context.supervisor.reconnect().await);
    assert_eq!(context.provider.lookup_count(), 3);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn failed_probe_triggers_single_auto_reconnect(context: SupervisorContext) {
    let interval = context.supervisor.config().health_check_interval();
    let server = context.register_connected_server(&target("proj-1"));
    assert!(context.supervisor.connect(target("proj-1")).await);
    assert_eq!(context.supervisor.attempt(), 0);
    assert!(context.supervisor.is_health_check_active());

    server.set_inactive(true).expect("knob should apply");
    let replacement = context.register_connected_server(&target("proj-1"));
    tokio::time::sleep(interval + Duration::from_millis(10)).await;

    assert_eq!(context.provider.lookup_count(), 2);
    assert_eq!(context.supervisor.status(), ConnectionStatus::Connected);
    assert_eq!(context.supervisor.metrics().success_count(), 2);
    assert!(replacement.is_connection_active());
    let successes = context.notifier.shown_of_kind(NoticeKind::Success);
    assert_eq!(successes.len(), 1);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn disabling_feature_disconnects_and_cancels_probe(context: SupervisorContext) {
    assert!(context.supervisor.connect(target("proj-1")).await);

    context.supervisor.set_enabled(false).await;

    assert_eq!(context.supervisor.status(), ConnectionStatus::Disconnected);
    assert!(!context.supervisor.has_server());
    assert!(!context.supervisor.is_health_check_active());
    assert!(!context.supervisor.is_enabled());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn connect_time_average_tracks_each_success(context: SupervisorContext) {
    for delay_ms in [30, 50, 70] {
        context
            .provider
            .set_lookup_delay(Duration::from_millis(delay_ms))
            .expect("knob should apply");
        assert!(context.supervisor.connect(target("proj-1")).await);
    }

    let metrics = context.supervisor.metrics();
    assert_eq!(metrics.success_count(), 3);
    assert_eq!(metrics.average_connect_ms(), 50);
}

#[tokio::test(start_paused = true)]
async fn repeated_failures_within_cooldown_raise_one_error_notice() {
    let context = failing_context(SupervisorConfig {
        max_retries: 1,
        ..SupervisorConfig::default()
    });

    for _ in 0..3 {
        assert!(!context.supervisor.connect(target("proj-2")).await);
    }

    assert_eq!(context.notifier.shown_of_kind(NoticeKind::Error).len(), 1);
    let dismissals = context
        .notifier
        .events()
        .into_iter()
        .filter(|event| matches!(event, NoticeEvent::Dismissed(_)))
        .count();
    assert_eq!(dismissals, 2);
    assert_eq!(context.supervisor.metrics().failure_count(), 3);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn tool_calls_carry_current_target(context: SupervisorContext) {
    let server = context.register_connected_server(&target("proj-7"));
    server
        .set_tools(vec![
            ToolDescriptor::new("add_scene", "Adds a scene", json!({"type": "object"}))
                .expect("valid tool"),
        ])
        .expect("catalog should apply");
    assert!(context.supervisor.connect(target("proj-7")).await);

    let result = context
        .supervisor
        .execute_tool("add_scene", json!({"title": "Opening"}))
        .await
        .expect("tool call should succeed");

    assert!(!result.is_error());
    assert_eq!(result.content()["params"]["target"], "proj-7");
    assert_eq!(
        context
            .supervisor
            .list_tools()
            .await
            .expect("listing should succeed")
            .len(),
        1
    );
}

#[rstest]
#[tokio::test]
async fn tool_calls_require_connection(context: SupervisorContext) {
    let result = context
        .supervisor
        .execute_tool("add_scene", json!({"title": "Opening"}))
        .await;

    assert!(matches!(result, Err(SupervisorError::NotConnected)));
}
