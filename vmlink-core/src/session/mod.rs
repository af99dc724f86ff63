//! Endpoint session management
//!
//! [`SessionContext`] owns the adapter, the reconnect policy and, per
//! endpoint kind, the credential cache and connection state. The top-level
//! workflow builds one context and passes it to every operation.

pub mod disconnect;
pub mod health;
pub mod reconnect;
pub mod state;
pub mod token;
pub mod version;

use crate::config::toml_config::TomlConfig;
use crate::credentials::CredentialCache;
use crate::sdk::{find_live_of_kind, ConnectionHandle, VirtualizationSdk};
use crate::types::EndpointKind;
use health::ConnectionTestResult;
use reconnect::ReconnectPolicy;
use state::ConnectionState;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use token::TokenTtl;
use tracing::debug;

/// Per-endpoint bookkeeping
#[derive(Debug, Default)]
struct EndpointSession {
    cache: CredentialCache,
    /// Address of the session this context opened or adopted
    address: Option<String>,
    state: ConnectionState,
}

/// Connection state for both endpoints, bound to one adapter
#[derive(Debug)]
pub struct SessionContext<S: VirtualizationSdk> {
    sdk: S,
    policy: ReconnectPolicy,
    credential_files: HashMap<EndpointKind, PathBuf>,
    controller: EndpointSession,
    hypervisor: EndpointSession,
}

impl<S: VirtualizationSdk> SessionContext<S> {
    pub fn new(sdk: S, policy: ReconnectPolicy) -> Self {
        Self {
            sdk,
            policy,
            credential_files: HashMap::new(),
            controller: EndpointSession::default(),
            hypervisor: EndpointSession::default(),
        }
    }

    /// Build a context with the policy and credential file paths from `config`
    pub fn from_config(sdk: S, config: &TomlConfig, config_dir: &Path) -> Self {
        let mut context = Self::new(sdk, config.reconnection.clone());
        for kind in EndpointKind::ALL {
            let path = config.endpoint(kind).credential_file_or_default(kind, config_dir);
            context.credential_files.insert(kind, path);
        }
        context
    }

    /// Use `path` as the credentials file for `kind`
    pub fn with_credential_file(mut self, kind: EndpointKind, path: impl Into<PathBuf>) -> Self {
        self.credential_files.insert(kind, path.into());
        self
    }

    pub fn sdk(&self) -> &S {
        &self.sdk
    }

    pub fn sdk_mut(&mut self) -> &mut S {
        &mut self.sdk
    }

    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    /// Current state of the `kind` endpoint
    pub fn state(&self, kind: EndpointKind) -> &ConnectionState {
        &self.endpoint(kind).state
    }

    /// Credential cache of the `kind` endpoint
    pub fn cache(&self, kind: EndpointKind) -> &CredentialCache {
        &self.endpoint(kind).cache
    }

    /// Configured credentials file for `kind`, if any
    pub fn credential_file(&self, kind: EndpointKind) -> Option<&Path> {
        self.credential_files.get(&kind).map(PathBuf::as_path)
    }

    /// The live handle this context holds for `kind`
    ///
    /// The adapter registry is authoritative: a handle closed behind the
    /// context's back is not returned.
    pub fn current_handle(&self, kind: EndpointKind) -> Option<ConnectionHandle> {
        let address = self.endpoint(kind).address.as_deref()?;
        find_live_of_kind(&self.sdk, kind, address)
    }

    /// Remaining lifetime of the `kind` session token
    ///
    /// Hypervisor session ids are opaque and carry no expiry, so only
    /// controller sessions ever report minutes.
    pub fn token_time_to_live(&self, kind: EndpointKind) -> TokenTtl {
        if kind == EndpointKind::Hypervisor {
            return TokenTtl::NoToken;
        }
        let handle = self.current_handle(kind);
        token::time_to_live(handle.as_ref().and_then(|h| h.session_token.as_deref()))
    }

    /// Test the session to `endpoint_address`, see [`health::test_connection`]
    pub fn test_connection(
        &mut self,
        endpoint_address: &str,
        skip_liveness_probe: bool,
    ) -> ConnectionTestResult {
        health::test_connection(&mut self.sdk, endpoint_address, skip_liveness_probe)
    }

    fn endpoint(&self, kind: EndpointKind) -> &EndpointSession {
        match kind {
            EndpointKind::Controller => &self.controller,
            EndpointKind::Hypervisor => &self.hypervisor,
        }
    }

    fn endpoint_mut(&mut self, kind: EndpointKind) -> &mut EndpointSession {
        match kind {
            EndpointKind::Controller => &mut self.controller,
            EndpointKind::Hypervisor => &mut self.hypervisor,
        }
    }

    fn set_state(&mut self, kind: EndpointKind, state: ConnectionState) {
        let endpoint = self.endpoint_mut(kind);
        if endpoint.state != state {
            debug!("{} state: {} -> {}", kind, endpoint.state, state);
            endpoint.state = state;
        }
    }
}
