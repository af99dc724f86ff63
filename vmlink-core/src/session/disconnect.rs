//! Disconnecting sessions
//!
//! Disconnecting is idempotent. Cached credentials survive a disconnect so
//! a later forced connect can reuse them without prompting.

use super::state::ConnectionState;
use super::SessionContext;
use crate::error::{Result, SessionError};
use crate::sdk::{ConnectionHandle, VirtualizationSdk};
use crate::types::EndpointKind;
use tracing::info;

/// Which sessions to close
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectTarget {
    /// Every live session of one endpoint kind
    Endpoint(EndpointKind),
    /// The live session to one address
    Address(String),
    /// Every live session in the registry
    All,
}

impl DisconnectTarget {
    fn matches(&self, handle: &ConnectionHandle) -> bool {
        match self {
            DisconnectTarget::Endpoint(kind) => handle.is_connected && handle.kind == *kind,
            DisconnectTarget::Address(address) => handle.is_live_for(address),
            DisconnectTarget::All => handle.is_connected,
        }
    }
}

/// Result of a disconnect that left nothing behind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectOutcome {
    /// Addresses whose sessions were closed
    Disconnected(Vec<String>),
    /// There was nothing to close
    NothingConnected,
}

impl<S: VirtualizationSdk> SessionContext<S> {
    /// Close the sessions selected by `target`
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::DisconnectIncomplete`] when any selected
    /// session is still registered afterwards.
    pub fn disconnect(&mut self, target: &DisconnectTarget) -> Result<DisconnectOutcome> {
        let selected: Vec<ConnectionHandle> = self
            .sdk
            .connections()
            .into_iter()
            .filter(|handle| target.matches(handle))
            .collect();

        if selected.is_empty() {
            info!("No connection to disconnect");
            return Ok(DisconnectOutcome::NothingConnected);
        }

        let mut closed = Vec::new();
        for handle in &selected {
            match self.sdk.disconnect(handle) {
                Ok(()) => {
                    info!("Disconnected from {} {}", handle.kind, handle.endpoint_address);
                    closed.push(handle.endpoint_address.clone());
                }
                Err(e) => {
                    crate::exception!(
                        "Failed to disconnect from {} {}: {}",
                        handle.kind,
                        handle.endpoint_address,
                        e
                    );
                }
            }
        }

        for kind in EndpointKind::ALL {
            if self.current_handle(kind).is_none() {
                self.set_state(kind, ConnectionState::Disconnected);
            }
        }

        let remaining: Vec<String> = self
            .sdk
            .connections()
            .into_iter()
            .filter(|handle| target.matches(handle))
            .map(|handle| handle.endpoint_address)
            .collect();

        if !remaining.is_empty() {
            return Err(SessionError::DisconnectIncomplete { remaining }.into());
        }
        Ok(DisconnectOutcome::Disconnected(closed))
    }

    /// Close every session, see [`SessionContext::disconnect`]
    pub fn disconnect_all(&mut self) -> Result<DisconnectOutcome> {
        self.disconnect(&DisconnectTarget::All)
    }
}
