//! Credential cache for reconnect-without-prompt

use crate::types::{EndpointCredentials, EndpointSecret};

/// Last accepted credentials for one endpoint
///
/// The cache is the only source a silent reconnect may use. It is written
/// after an authentication succeeds, never before, so a failed attempt
/// leaves the previous values in place.
#[derive(Debug, Clone, Default)]
pub struct CredentialCache {
    address: Option<String>,
    username: Option<String>,
    secret: Option<EndpointSecret>,
}

impl CredentialCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether address, username and secret are all present and non-blank
    pub fn is_complete(&self) -> bool {
        let filled = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());
        filled(&self.address)
            && filled(&self.username)
            && self.secret.as_ref().is_some_and(|s| !s.is_blank())
    }

    /// Overwrite every field
    pub fn store(&mut self, credentials: &EndpointCredentials) {
        self.address = Some(credentials.address.clone());
        self.username = Some(credentials.username.clone());
        self.secret = Some(credentials.secret.clone());
    }

    /// Cached credentials, when complete
    pub fn credentials(&self) -> Option<EndpointCredentials> {
        if !self.is_complete() {
            return None;
        }
        Some(EndpointCredentials::new(
            self.address.clone()?,
            self.username.clone()?,
            self.secret.clone()?,
        ))
    }

    /// Cached address, if any
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }
}
