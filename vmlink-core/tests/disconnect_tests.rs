//! Tests for disconnecting sessions

mod common;

use chrono::Duration;
use common::*;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;
use tracing_subscriber::layer::SubscriberExt;
use vmlink_core::error::{SessionError, VmlinkError};
use vmlink_core::exit_code::ExitCode;
use vmlink_core::logging::{OperationLog, OperationLogLayer, Severity};
use vmlink_core::sdk::{InMemorySdk, VirtualizationSdk};
use vmlink_core::session::disconnect::{DisconnectOutcome, DisconnectTarget};
use vmlink_core::session::reconnect::{ConnectOptions, ReconnectPolicy};
use vmlink_core::session::state::ConnectionState;
use vmlink_core::session::SessionContext;
use vmlink_core::types::EndpointKind;

fn both_connected(dir: &Path) -> SessionContext<InMemorySdk> {
    let hypervisor_file = write_valid_credentials(dir, EndpointKind::Hypervisor);
    let mut context = connected_context(dir, EndpointKind::Controller, Duration::minutes(60))
        .with_credential_file(EndpointKind::Hypervisor, hypervisor_file);
    context
        .connect(EndpointKind::Hypervisor, &ConnectOptions::default(), &mut NoPrompt)
        .unwrap();
    context.sdk_mut().reset_calls();
    context
}

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_disconnect_all_twice() {
    let dir = tempdir().unwrap();
    let mut context = both_connected(dir.path());

    let first = context.disconnect_all().unwrap();
    match first {
        DisconnectOutcome::Disconnected(addresses) => {
            assert_eq!(addresses.len(), 2);
            assert!(addresses.contains(&SDDC.to_string()));
            assert!(addresses.contains(&VCENTER.to_string()));
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert!(context.sdk().connections().is_empty());

    let second = context.disconnect_all().unwrap();
    assert_eq!(second, DisconnectOutcome::NothingConnected);
    assert_eq!(context.sdk().calls().disconnect, 2);
}

#[test]
fn test_nothing_connected_is_logged() {
    let dir = tempdir().unwrap();
    let mut context = both_connected(dir.path());
    context.disconnect_all().unwrap();

    let console = Captured::default();
    let log = OperationLog::new(Severity::Info).with_console_writer(console.clone());
    let subscriber = tracing_subscriber::registry().with(OperationLogLayer::new(log));

    let outcome = tracing::subscriber::with_default(subscriber, || context.disconnect_all().unwrap());

    assert_eq!(outcome, DisconnectOutcome::NothingConnected);
    let text = String::from_utf8(console.0.lock().unwrap().clone()).unwrap();
    assert!(text.contains("[INFO] No connection to disconnect"), "got {:?}", text);
}

#[test]
fn test_disconnect_updates_state_but_keeps_cache() {
    let dir = tempdir().unwrap();
    let mut context = both_connected(dir.path());

    context.disconnect_all().unwrap();

    for kind in EndpointKind::ALL {
        assert_eq!(context.state(kind), &ConnectionState::Disconnected);
        assert!(context.current_handle(kind).is_none());
        assert!(context.cache(kind).is_complete());
    }
}

#[test]
fn test_disconnect_one_endpoint() {
    let dir = tempdir().unwrap();
    let mut context = both_connected(dir.path());

    let outcome = context
        .disconnect(&DisconnectTarget::Endpoint(EndpointKind::Hypervisor))
        .unwrap();

    assert_eq!(outcome, DisconnectOutcome::Disconnected(vec![VCENTER.to_string()]));
    assert!(context.current_handle(EndpointKind::Controller).is_some());
    assert_eq!(context.state(EndpointKind::Controller), &ConnectionState::Connected);
    assert_eq!(context.state(EndpointKind::Hypervisor), &ConnectionState::Disconnected);
}

#[test]
fn test_disconnect_by_address() {
    let dir = tempdir().unwrap();
    let mut context = both_connected(dir.path());

    let outcome = context
        .disconnect(&DisconnectTarget::Address("SDDC01.lab.local".to_string()))
        .unwrap();

    assert_eq!(outcome, DisconnectOutcome::Disconnected(vec![SDDC.to_string()]));
    assert_eq!(context.sdk().connections().len(), 1);
}

#[test]
fn test_disconnect_failure_is_incomplete() {
    let dir = tempdir().unwrap();
    let mut context = both_connected(dir.path());
    context.sdk_mut().fail_next_disconnect("Operation timed out");

    let err = context.disconnect_all().unwrap_err();

    match &err {
        VmlinkError::Session(SessionError::DisconnectIncomplete { remaining }) => {
            assert_eq!(remaining.len(), 1)
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(err.exit_code(), ExitCode::OperationFailed);
    assert_eq!(context.sdk().connections().len(), 1);
}

#[test]
fn test_disconnect_without_any_session() {
    let mut context = SessionContext::new(lab_sdk(), ReconnectPolicy::default());

    assert_eq!(
        context
            .disconnect(&DisconnectTarget::Endpoint(EndpointKind::Controller))
            .unwrap(),
        DisconnectOutcome::NothingConnected
    );
    assert_eq!(context.sdk().calls().total(), 0);
}
