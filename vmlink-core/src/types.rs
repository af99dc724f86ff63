//! Type definitions and wrappers for secure data handling
//!
//! This module provides type-safe wrappers for sensitive data using the
//! secrecy crate to prevent accidental exposure in logs or debug output.

use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The two kinds of remote endpoint the toolkit authenticates against
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    /// Management controller issuing JWT bearer tokens
    Controller,
    /// Virtualization server (vCenter or standalone host)
    Hypervisor,
}

impl EndpointKind {
    /// Both endpoint kinds, in disconnect order
    pub const ALL: [EndpointKind; 2] = [EndpointKind::Hypervisor, EndpointKind::Controller];

    /// Short lower-case name, also used for credential file names
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointKind::Controller => "controller",
            EndpointKind::Hypervisor => "hypervisor",
        }
    }

    /// JSON field names used by this endpoint kind's credential file
    pub fn credential_fields(&self) -> CredentialFields {
        match self {
            EndpointKind::Controller => CredentialFields {
                address: "address",
                username: "username",
                secret: "secret",
            },
            EndpointKind::Hypervisor => CredentialFields {
                address: "server",
                username: "user",
                secret: "password",
            },
        }
    }
}

impl std::fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EndpointKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "controller" | "sddc" => Ok(EndpointKind::Controller),
            "hypervisor" | "vcenter" | "esx" => Ok(EndpointKind::Hypervisor),
            other => Err(format!("unknown endpoint kind: {}", other)),
        }
    }
}

/// Credential file field names for one endpoint kind
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CredentialFields {
    pub address: &'static str,
    pub username: &'static str,
    pub secret: &'static str,
}

impl CredentialFields {
    /// Field names in file order
    pub fn all(&self) -> [&'static str; 3] {
        [self.address, self.username, self.secret]
    }
}

/// Wrapper for an endpoint password
///
/// The value is never printed by `Debug` and is zeroed when dropped.
#[derive(Clone, Debug)]
pub struct EndpointSecret(Secret<String>);

impl EndpointSecret {
    /// Create a new secret from a plain string
    pub fn new(secret: String) -> Self {
        Self(Secret::new(secret))
    }

    /// Expose the secret value (use with caution!)
    ///
    /// This should only be called when handing the secret to the
    /// endpoint adapter.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Run `f` with the plain secret, keeping the exposure scoped to the closure
    pub fn with_exposed<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        f(self.0.expose_secret())
    }

    /// Whether the secret is empty or whitespace only
    pub fn is_blank(&self) -> bool {
        self.expose().trim().is_empty()
    }
}

impl From<String> for EndpointSecret {
    fn from(secret: String) -> Self {
        Self::new(secret)
    }
}

/// Address, username and secret for one endpoint
#[derive(Clone, Debug)]
pub struct EndpointCredentials {
    pub address: String,
    pub username: String,
    pub secret: EndpointSecret,
}

impl EndpointCredentials {
    pub fn new(address: impl Into<String>, username: impl Into<String>, secret: EndpointSecret) -> Self {
        Self {
            address: address.into(),
            username: username.into(),
            secret,
        }
    }

    /// Names of the fields that are empty, using the given file field names
    pub fn blank_fields(&self, fields: &CredentialFields) -> Vec<String> {
        let mut blank = Vec::new();
        if self.address.trim().is_empty() {
            blank.push(fields.address.to_string());
        }
        if self.username.trim().is_empty() {
            blank.push(fields.username.to_string());
        }
        if self.secret.is_blank() {
            blank.push(fields.secret.to_string());
        }
        blank
    }
}

/// Where a set of credentials came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CredentialOrigin {
    /// The session credential cache
    Cache,
    /// A JSON credentials file
    File,
    /// Interactive terminal input
    Interactive,
}

impl std::fmt::Display for CredentialOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialOrigin::Cache => write!(f, "cached credentials"),
            CredentialOrigin::File => write!(f, "credentials file"),
            CredentialOrigin::Interactive => write!(f, "interactive input"),
        }
    }
}
