//! Error types for the vmlink toolkit
//!
//! This module defines all error types used throughout the toolkit,
//! and the mapping from each error to the process exit code that a
//! calling workflow reports.

use crate::exit_code::ExitCode;
use crate::types::EndpointKind;
use thiserror::Error;

/// Main error type for the vmlink toolkit
#[derive(Error, Debug)]
pub enum VmlinkError {
    /// Errors related to configuration and credential files
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Errors related to resolving or persisting credentials
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    /// Errors related to endpoint sessions
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Errors related to bearer token decoding
    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing errors
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VmlinkError {
    /// Exit code a top-level workflow should terminate with for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            VmlinkError::Config(_) | VmlinkError::Credential(_) => {
                ExitCode::ConfigurationError
            }
            VmlinkError::Toml(_) | VmlinkError::TomlSerialize(_) => ExitCode::ConfigurationError,
            VmlinkError::Session(session) => session.exit_code(),
            VmlinkError::Token(_) => ExitCode::GeneralError,
            VmlinkError::Io(_) | VmlinkError::Json(_) => ExitCode::GeneralError,
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {path}")]
    LoadFailed { path: String },

    #[error("Failed to save configuration file: {path}")]
    SaveFailed { path: String },

    #[error("Configuration validation error: {message}")]
    ValidationError { message: String },

    #[error("I/O error: {message}")]
    IoError { message: String },

    #[error("Credential file is missing required fields: {summary}")]
    MissingFields { summary: String },

    #[error("Credential file has empty values for: {}", fields.join(", "))]
    EmptyFields { fields: Vec<String> },

    #[error("No {kind} credentials available: {path} does not exist and prompting is disabled")]
    CredentialsUnavailable { kind: EndpointKind, path: String },
}

/// Credential resolution and persistence errors
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Failed to read {field} from the terminal: {reason}")]
    PromptFailed { field: String, reason: String },

    #[error("Failed to write credential file {path}: {reason}")]
    PersistFailed { path: String, reason: String },

    #[error("Cached {kind} credentials are incomplete")]
    Incomplete { kind: EndpointKind },
}

/// Endpoint session errors
///
/// The first six variants mirror the SDK error classification so that a
/// failed connect surfaces with the same category the adapter detected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Authentication to {address} failed: {reason}")]
    Authentication { address: String, reason: String },

    #[error("Unable to reach {address}: {reason}")]
    Network { address: String, reason: String },

    #[error("TLS negotiation with {address} failed: {reason}")]
    Certificate { address: String, reason: String },

    #[error("Session to {address} is no longer valid: {reason}")]
    SessionInvalid { address: String, reason: String },

    #[error("Endpoint adapter unavailable: {reason}")]
    Environment { reason: String },

    #[error("Not connected to any {kind}")]
    NotConnected { kind: EndpointKind },

    #[error("Disconnect incomplete, {} session(s) still registered: {}", remaining.len(), remaining.join(", "))]
    DisconnectIncomplete { remaining: Vec<String> },

    #[error("{kind} version {actual} is older than the required {required}")]
    VersionTooOld {
        kind: EndpointKind,
        actual: String,
        required: String,
    },

    #[error("Operation cancelled by user")]
    UserCancelled,

    #[error("Operation failed: {reason}")]
    OperationFailed { reason: String },
}

impl SessionError {
    /// Exit code for this session failure
    pub fn exit_code(&self) -> ExitCode {
        match self {
            SessionError::Authentication { .. } => ExitCode::AuthenticationError,
            SessionError::Network { .. }
            | SessionError::Certificate { .. }
            | SessionError::SessionInvalid { .. }
            | SessionError::NotConnected { .. } => ExitCode::ConnectionError,
            SessionError::Environment { .. } => ExitCode::GeneralError,
            SessionError::DisconnectIncomplete { .. } | SessionError::OperationFailed { .. } => {
                ExitCode::OperationFailed
            }
            SessionError::VersionTooOld { .. } => ExitCode::PreconditionError,
            SessionError::UserCancelled => ExitCode::UserCancelled,
        }
    }
}

/// Bearer token decoding errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token has no payload segment")]
    MissingPayload,

    #[error("Token payload is not valid base64: {reason}")]
    InvalidBase64 { reason: String },

    #[error("Token payload is not valid UTF-8")]
    InvalidUtf8,

    #[error("Token payload is not a valid claims object: {reason}")]
    InvalidClaims { reason: String },

    #[error("Token expiry {exp} is outside the representable range")]
    ExpiryOutOfRange { exp: i64 },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, VmlinkError>;
