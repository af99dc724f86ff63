//! In-memory endpoint adapter
//!
//! Provides a deterministic [`VirtualizationSdk`] that doesn't require a
//! reachable endpoint. Accounts are registered up front, failures can be
//! scripted, and every remote call is counted so callers can assert exactly
//! which calls a workflow made.

use crate::sdk::{ConnectionHandle, SdkError, SdkErrorKind, VirtualizationSdk};
use crate::types::{EndpointCredentials, EndpointKind};
use chrono::{Duration, Utc};
use data_encoding::BASE64URL_NOPAD;
use std::collections::{HashMap, VecDeque};

/// Number of remote calls made through an [`InMemorySdk`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SdkCallCounts {
    pub authenticate: usize,
    pub disconnect: usize,
    pub probe: usize,
}

impl SdkCallCounts {
    /// Total number of remote calls
    pub fn total(&self) -> usize {
        self.authenticate + self.disconnect + self.probe
    }
}

#[derive(Debug, Clone)]
struct Account {
    username: String,
    secret: String,
    version: String,
}

/// Build an unsigned three-part bearer token expiring at `exp` (Unix seconds)
pub fn bearer_token_expiring_at(exp: i64) -> String {
    let header = BASE64URL_NOPAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = BASE64URL_NOPAD.encode(format!(r#"{{"sub":"vmlink","exp":{}}}"#, exp).as_bytes());
    format!("{}.{}.unsigned", header, payload)
}

/// Deterministic adapter backed by a registry held in memory
#[derive(Debug)]
pub struct InMemorySdk {
    accounts: HashMap<(EndpointKind, String), Account>,
    registry: Vec<ConnectionHandle>,
    token_lifetime: Duration,
    auth_failures: VecDeque<String>,
    probe_failures: VecDeque<String>,
    disconnect_failures: VecDeque<String>,
    next_id: u64,
    calls: SdkCallCounts,
}

impl Default for InMemorySdk {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySdk {
    pub fn new() -> Self {
        Self {
            accounts: HashMap::new(),
            registry: Vec::new(),
            token_lifetime: Duration::minutes(60),
            auth_failures: VecDeque::new(),
            probe_failures: VecDeque::new(),
            disconnect_failures: VecDeque::new(),
            next_id: 1,
            calls: SdkCallCounts::default(),
        }
    }

    /// Register an account that `authenticate` accepts
    pub fn with_account(
        mut self,
        kind: EndpointKind,
        address: &str,
        username: &str,
        secret: &str,
        version: &str,
    ) -> Self {
        self.accounts.insert(
            (kind, address.to_ascii_lowercase()),
            Account {
                username: username.to_string(),
                secret: secret.to_string(),
                version: version.to_string(),
            },
        );
        self
    }

    /// Lifetime of controller bearer tokens issued from now on
    pub fn with_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.token_lifetime = lifetime;
        self
    }

    /// Make the next `authenticate` call fail with `message`
    pub fn fail_next_authenticate(&mut self, message: &str) {
        self.auth_failures.push_back(message.to_string());
    }

    /// Make the next `probe` call fail with `message`
    pub fn fail_next_probe(&mut self, message: &str) {
        self.probe_failures.push_back(message.to_string());
    }

    /// Make the next `disconnect` call fail with `message`, leaving the session registered
    pub fn fail_next_disconnect(&mut self, message: &str) {
        self.disconnect_failures.push_back(message.to_string());
    }

    /// Replace the session token of every live handle to `address`
    pub fn set_session_token(&mut self, address: &str, token: Option<String>) {
        for handle in self.registry.iter_mut().filter(|h| h.is_live_for(address)) {
            handle.session_token = token.clone();
        }
    }

    /// Remote calls made so far
    pub fn calls(&self) -> SdkCallCounts {
        self.calls
    }

    /// Reset the call counters
    pub fn reset_calls(&mut self) {
        self.calls = SdkCallCounts::default();
    }

    fn issue_token(&self, kind: EndpointKind, id: u64) -> String {
        match kind {
            EndpointKind::Controller => {
                bearer_token_expiring_at((Utc::now() + self.token_lifetime).timestamp())
            }
            EndpointKind::Hypervisor => format!("vmware-api-session-{:08x}", id),
        }
    }
}

impl VirtualizationSdk for InMemorySdk {
    fn authenticate(
        &mut self,
        kind: EndpointKind,
        credentials: &EndpointCredentials,
    ) -> Result<ConnectionHandle, SdkError> {
        self.calls.authenticate += 1;

        if let Some(message) = self.auth_failures.pop_front() {
            return Err(SdkError::from_raw(message));
        }

        let account = self
            .accounts
            .get(&(kind, credentials.address.to_ascii_lowercase()))
            .cloned()
            .ok_or_else(|| {
                SdkError::new(
                    SdkErrorKind::Network,
                    format!("Could not resolve host {}", credentials.address),
                )
            })?;

        let accepted = account.username == credentials.username
            && credentials.secret.with_exposed(|secret| secret == account.secret);
        if !accepted {
            return Err(SdkError::new(
                SdkErrorKind::Authentication,
                "Cannot complete login due to an incorrect user name or password.",
            ));
        }

        let id = self.next_id;
        self.next_id += 1;

        let handle = ConnectionHandle {
            id,
            kind,
            endpoint_address: credentials.address.clone(),
            username: credentials.username.clone(),
            is_connected: true,
            product_version: account.version,
            session_token: Some(self.issue_token(kind, id)),
            start_time: Some(Utc::now()),
        };
        self.registry.push(handle.clone());
        Ok(handle)
    }

    fn disconnect(&mut self, handle: &ConnectionHandle) -> Result<(), SdkError> {
        self.calls.disconnect += 1;

        if let Some(message) = self.disconnect_failures.pop_front() {
            return Err(SdkError::from_raw(message));
        }

        self.registry.retain(|h| h.id != handle.id);
        Ok(())
    }

    fn connections(&self) -> Vec<ConnectionHandle> {
        self.registry.clone()
    }

    fn probe(&mut self, handle: &ConnectionHandle) -> Result<(), SdkError> {
        self.calls.probe += 1;

        if let Some(message) = self.probe_failures.pop_front() {
            return Err(SdkError::from_raw(message));
        }

        if self.registry.iter().any(|h| h.id == handle.id && h.is_connected) {
            Ok(())
        } else {
            Err(SdkError::new(
                SdkErrorKind::SessionInvalid,
                "You are not currently connected to any servers.",
            ))
        }
    }
}
