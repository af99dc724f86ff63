//! Connection health checking
//!
//! A check runs in two phases. The registry lookup costs nothing and answers
//! "is there a session at all"; only when one exists, and the caller did not
//! ask to skip it, is a read-only call made to the endpoint.

use crate::sdk::{find_live, VirtualizationSdk};
use crate::timing::Stopwatch;
use chrono::Utc;
use std::time::Duration;
use tracing::{debug, warn};

/// Result of a connection test
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTestResult {
    is_connected: bool,
    endpoint_address: String,
    session_age: Option<Duration>,
    error_message: Option<String>,
}

impl ConnectionTestResult {
    /// Create a successful test result
    pub fn connected(endpoint_address: &str, session_age: Duration) -> Self {
        Self {
            is_connected: true,
            endpoint_address: endpoint_address.to_string(),
            session_age: Some(session_age),
            error_message: None,
        }
    }

    /// Create a failed test result
    pub fn failure(endpoint_address: &str, session_age: Option<Duration>, error: String) -> Self {
        Self {
            is_connected: false,
            endpoint_address: endpoint_address.to_string(),
            session_age,
            error_message: Some(error),
        }
    }

    /// Check if the endpoint answered as connected
    pub fn is_connected(&self) -> bool {
        self.is_connected
    }

    /// Address that was tested
    pub fn endpoint_address(&self) -> &str {
        &self.endpoint_address
    }

    /// Age of the session, when one was found
    pub fn session_age(&self) -> Option<Duration> {
        self.session_age
    }

    /// Get the error message if the test failed
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

/// Test whether a usable session to `endpoint_address` exists
///
/// Never fails: every outcome is reported through the returned result.
#[tracing::instrument(skip(sdk), fields(endpoint = %endpoint_address))]
pub fn test_connection<S: VirtualizationSdk + ?Sized>(
    sdk: &mut S,
    endpoint_address: &str,
    skip_liveness_probe: bool,
) -> ConnectionTestResult {
    let handle = match find_live(sdk, endpoint_address) {
        Some(handle) => handle,
        None => {
            debug!("No live session registered for {}", endpoint_address);
            return ConnectionTestResult::failure(
                endpoint_address,
                None,
                format!("Not connected to {}: no active session found", endpoint_address),
            );
        }
    };

    let session_age = handle
        .start_time
        .and_then(|started| (Utc::now() - started).to_std().ok())
        .unwrap_or(Duration::ZERO);

    if skip_liveness_probe {
        debug!("Session found, liveness probe skipped");
        return ConnectionTestResult::connected(endpoint_address, session_age);
    }

    let watch = Stopwatch::start(format!("liveness probe of {}", endpoint_address));
    let outcome = sdk.probe(&handle);
    watch.finish();

    match outcome {
        Ok(()) => ConnectionTestResult::connected(endpoint_address, session_age),
        Err(e) => {
            let message = format!("{}: {}", e.kind.category(), e.message);
            warn!(
                endpoint = %endpoint_address,
                kind = ?e.kind,
                "Liveness probe failed: {}",
                message
            );
            ConnectionTestResult::failure(endpoint_address, Some(session_age), message)
        }
    }
}
