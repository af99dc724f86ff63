//! Tests for token-driven and probe-driven reconnects

mod common;

use chrono::Duration;
use common::*;
use tempfile::tempdir;
use vmlink_core::error::{ConfigError, VmlinkError};
use vmlink_core::sdk::{InMemorySdk, VirtualizationSdk};
use vmlink_core::session::reconnect::{ConnectOptions, HealthOutcome, ReconnectPolicy};
use vmlink_core::session::state::ConnectionState;
use vmlink_core::session::SessionContext;
use vmlink_core::types::EndpointKind;

#[test]
fn test_ttl_below_threshold_reconnects_silently_once() {
    let dir = tempdir().unwrap();
    let mut context = connected_context(dir.path(), EndpointKind::Controller, Duration::minutes(10));
    let ttl = context.token_time_to_live(EndpointKind::Controller).minutes().unwrap();
    assert!(ttl > 9.0 && ttl <= 10.0, "got {}", ttl);

    let outcome = context
        .ensure_healthy_connection(EndpointKind::Controller, &mut NoPrompt)
        .unwrap();

    assert_eq!(outcome, HealthOutcome::SilentlyReconnected);
    assert_eq!(context.sdk().calls().authenticate, 1);
    assert_eq!(context.sdk().calls().probe, 0);
    assert_eq!(context.state(EndpointKind::Controller), &ConnectionState::Connected);
    // the superseded session is closed, one handle per address remains
    assert_eq!(context.sdk().connections().len(), 1);
}

#[test]
fn test_ttl_above_threshold_does_nothing() {
    let dir = tempdir().unwrap();
    let mut context = connected_context(dir.path(), EndpointKind::Controller, Duration::minutes(45));

    let outcome = context
        .ensure_healthy_connection(EndpointKind::Controller, &mut NoPrompt)
        .unwrap();

    assert_eq!(outcome, HealthOutcome::Healthy);
    assert_eq!(context.sdk().calls().total(), 0);
}

#[test]
fn test_failed_silent_reconnect_leaves_state_and_cache() {
    let dir = tempdir().unwrap();
    let mut context = connected_context(dir.path(), EndpointKind::Controller, Duration::minutes(5));
    context.sdk_mut().fail_next_authenticate("Connection refused");

    let outcome = context
        .ensure_healthy_connection(EndpointKind::Controller, &mut NoPrompt)
        .unwrap();

    assert!(matches!(outcome, HealthOutcome::SilentReconnectFailed(_)));
    assert_eq!(context.sdk().calls().authenticate, 1);
    assert_eq!(
        context.state(EndpointKind::Controller),
        &ConnectionState::TokenExpiringSoon
    );
    assert!(context.cache(EndpointKind::Controller).is_complete());
    assert!(context.current_handle(EndpointKind::Controller).is_some());
}

#[test]
fn test_threshold_follows_policy() {
    let dir = tempdir().unwrap();
    let path = write_valid_credentials(dir.path(), EndpointKind::Controller);
    let policy = ReconnectPolicy {
        min_ttl_minutes: 5,
        ..Default::default()
    };
    let sdk = lab_sdk().with_token_lifetime(Duration::minutes(10));
    let mut context =
        SessionContext::new(sdk, policy).with_credential_file(EndpointKind::Controller, path);
    context
        .connect(EndpointKind::Controller, &ConnectOptions::default(), &mut NoPrompt)
        .unwrap();

    let outcome = context
        .ensure_healthy_connection(EndpointKind::Controller, &mut NoPrompt)
        .unwrap();
    assert_eq!(outcome, HealthOutcome::Healthy);
}

#[test]
fn test_session_without_token_is_probed() {
    let dir = tempdir().unwrap();
    let mut context = connected_context(dir.path(), EndpointKind::Hypervisor, Duration::minutes(60));

    let outcome = context
        .ensure_healthy_connection(EndpointKind::Hypervisor, &mut NoPrompt)
        .unwrap();

    assert_eq!(outcome, HealthOutcome::Healthy);
    assert_eq!(context.sdk().calls().probe, 1);
    assert_eq!(context.sdk().calls().authenticate, 0);
}

#[test]
fn test_undecodable_token_falls_back_to_probe() {
    let dir = tempdir().unwrap();
    let mut context = connected_context(dir.path(), EndpointKind::Controller, Duration::minutes(60));
    context
        .sdk_mut()
        .set_session_token(SDDC, Some("not-a-jwt".to_string()));

    let outcome = context
        .ensure_healthy_connection(EndpointKind::Controller, &mut NoPrompt)
        .unwrap();

    assert_eq!(outcome, HealthOutcome::Healthy);
    assert_eq!(context.sdk().calls().probe, 1);
}

#[test]
fn test_invalid_session_triggers_reconnect() {
    let dir = tempdir().unwrap();
    let mut context = connected_context(dir.path(), EndpointKind::Hypervisor, Duration::minutes(60));
    context.sdk_mut().fail_next_probe("The session is not authenticated.");

    let outcome = context
        .ensure_healthy_connection(EndpointKind::Hypervisor, &mut NoPrompt)
        .unwrap();

    assert_eq!(outcome, HealthOutcome::Reconnected);
    assert_eq!(context.sdk().calls().authenticate, 1);
    assert_eq!(context.sdk().connections().len(), 1);
    assert_eq!(context.state(EndpointKind::Hypervisor), &ConnectionState::Connected);
}

#[test]
fn test_other_probe_failure_is_reported_without_reconnect() {
    let dir = tempdir().unwrap();
    let mut context = connected_context(dir.path(), EndpointKind::Hypervisor, Duration::minutes(60));
    context.sdk_mut().fail_next_probe("Permission to perform this operation was denied.");

    let outcome = context
        .ensure_healthy_connection(EndpointKind::Hypervisor, &mut NoPrompt)
        .unwrap();

    match outcome {
        HealthOutcome::ProbeFailed(reason) => {
            assert!(reason.starts_with("authentication or session invalid"))
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(context.sdk().calls().authenticate, 0);
    assert_eq!(context.state(EndpointKind::Hypervisor), &ConnectionState::ProbeFailed);
}

#[test]
fn test_never_connected_runs_full_connect_from_file() {
    let dir = tempdir().unwrap();
    let path = write_valid_credentials(dir.path(), EndpointKind::Hypervisor);
    let mut context = SessionContext::new(lab_sdk(), ReconnectPolicy::default())
        .with_credential_file(EndpointKind::Hypervisor, path);

    let outcome = context
        .ensure_healthy_connection(EndpointKind::Hypervisor, &mut NoPrompt)
        .unwrap();

    assert_eq!(outcome, HealthOutcome::Reconnected);
    assert!(context.current_handle(EndpointKind::Hypervisor).is_some());
}

#[test]
fn test_never_connected_non_interactive_without_file_fails() {
    let policy = ReconnectPolicy {
        non_interactive: true,
        ..Default::default()
    };
    let mut context = SessionContext::new(InMemorySdk::new(), policy);

    let err = context
        .ensure_healthy_connection(EndpointKind::Controller, &mut NoPrompt)
        .unwrap_err();

    assert!(matches!(
        err,
        VmlinkError::Config(ConfigError::CredentialsUnavailable { .. })
    ));
    assert_eq!(context.sdk().calls().authenticate, 0);
}

#[test]
fn test_forced_connect_prefers_cache() {
    let dir = tempdir().unwrap();
    let mut context = connected_context(dir.path(), EndpointKind::Controller, Duration::minutes(60));
    // the file is gone, only the cache can satisfy this
    std::fs::remove_file(dir.path().join("controller-credentials.json")).unwrap();

    let handle = context
        .connect(EndpointKind::Controller, &ConnectOptions::forced(), &mut NoPrompt)
        .unwrap();

    assert_eq!(handle.endpoint_address, SDDC);
    assert_eq!(context.sdk().calls().authenticate, 1);
}
