//! Remote endpoint adapter boundary
//!
//! Everything that talks to a controller or virtualization server goes
//! through [`VirtualizationSdk`]. Adapters translate whatever failure the
//! remote side produces into an [`SdkError`] with a typed [`SdkErrorKind`];
//! the rest of the toolkit only ever looks at the kind.

use crate::error::SessionError;
use crate::types::{EndpointCredentials, EndpointKind};
use chrono::{DateTime, Utc};

pub mod classify;
pub mod memory;
pub mod rest;

pub use classify::{classify, SdkErrorKind};
pub use memory::InMemorySdk;
pub use rest::RestSdk;

/// A session returned by a successful authentication
#[derive(Clone, PartialEq)]
pub struct ConnectionHandle {
    /// Adapter-assigned identifier, unique within one adapter
    pub id: u64,
    pub kind: EndpointKind,
    pub endpoint_address: String,
    pub username: String,
    pub is_connected: bool,
    pub product_version: String,
    /// Bearer token or session id, when the endpoint issued one
    pub session_token: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
}

impl ConnectionHandle {
    /// Whether this handle is a live session to `address`
    pub fn is_live_for(&self, address: &str) -> bool {
        self.is_connected && self.endpoint_address.eq_ignore_ascii_case(address)
    }
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("endpoint_address", &self.endpoint_address)
            .field("username", &self.username)
            .field("is_connected", &self.is_connected)
            .field("product_version", &self.product_version)
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("start_time", &self.start_time)
            .finish()
    }
}

/// A classified adapter failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct SdkError {
    pub kind: SdkErrorKind,
    pub message: String,
}

impl SdkError {
    pub fn new(kind: SdkErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Classify raw error text from the remote side
    pub fn from_raw(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: classify(&message),
            message,
        }
    }

    /// Convert into the session error reported for `address`
    pub fn into_session_error(self, address: &str) -> SessionError {
        let address = address.to_string();
        let reason = self.message;
        match self.kind {
            SdkErrorKind::Authentication | SdkErrorKind::Permission => {
                SessionError::Authentication { address, reason }
            }
            SdkErrorKind::Network | SdkErrorKind::Timeout => SessionError::Network { address, reason },
            SdkErrorKind::Certificate => SessionError::Certificate { address, reason },
            SdkErrorKind::SessionInvalid => SessionError::SessionInvalid { address, reason },
            SdkErrorKind::Environment => SessionError::Environment { reason },
            SdkErrorKind::Unknown => SessionError::OperationFailed {
                reason: format!("{}: {}", address, reason),
            },
        }
    }
}

/// Contract between the toolkit and a remote management API
///
/// Calls block until the remote side answers or the adapter's own
/// request timeout expires.
pub trait VirtualizationSdk {
    /// Open a new session
    fn authenticate(
        &mut self,
        kind: EndpointKind,
        credentials: &EndpointCredentials,
    ) -> Result<ConnectionHandle, SdkError>;

    /// Close a session and drop it from the registry
    fn disconnect(&mut self, handle: &ConnectionHandle) -> Result<(), SdkError>;

    /// Every session the adapter knows about
    fn connections(&self) -> Vec<ConnectionHandle>;

    /// Issue one cheap read-only call with the session
    fn probe(&mut self, handle: &ConnectionHandle) -> Result<(), SdkError>;
}

/// The live handle for `address`, if any
pub fn find_live<S: VirtualizationSdk + ?Sized>(sdk: &S, address: &str) -> Option<ConnectionHandle> {
    sdk.connections()
        .into_iter()
        .find(|handle| handle.is_live_for(address))
}

/// The live `kind` handle for `address`, if any
pub fn find_live_of_kind<S: VirtualizationSdk + ?Sized>(
    sdk: &S,
    kind: EndpointKind,
    address: &str,
) -> Option<ConnectionHandle> {
    sdk.connections()
        .into_iter()
        .find(|handle| handle.kind == kind && handle.is_live_for(address))
}
