//! Connect and reconnect orchestration
//!
//! `connect` resolves credentials (cache, file, then operator), guards
//! against duplicate sessions and retries interactive logins a bounded
//! number of times. `ensure_healthy_connection` is run before long
//! operations and decides between doing nothing, a silent reconnect with
//! cached credentials, and a full connect.

use super::state::ConnectionState;
use super::token::TokenTtl;
use super::SessionContext;
use crate::credentials::file::{load_credentials, save_plaintext};
use crate::credentials::prompt::prompt_credentials;
use crate::credentials::Prompter;
use crate::error::{ConfigError, CredentialError, Result, SessionError};
use crate::sdk::{find_live_of_kind, ConnectionHandle, SdkError, SdkErrorKind, VirtualizationSdk};
use crate::timing::Stopwatch;
use crate::types::{CredentialOrigin, EndpointCredentials, EndpointKind};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// When and how to reconnect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectPolicy {
    /// Reconnect silently once the bearer token has fewer minutes left
    pub min_ttl_minutes: u32,

    /// Logins attempted with operator input before giving up
    pub max_interactive_attempts: u32,

    /// Never prompt; a missing credentials file is an error
    pub non_interactive: bool,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            min_ttl_minutes: 30,
            max_interactive_attempts: 3,
            non_interactive: false,
        }
    }
}

/// Reconnect policy values out of range
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyValidationError {
    #[error("min_ttl_minutes must be between 1 and 1440, got {0}")]
    MinTtlOutOfRange(u32),

    #[error("max_interactive_attempts must be between 1 and 10, got {0}")]
    AttemptsOutOfRange(u32),
}

impl ReconnectPolicy {
    pub fn validate(&self) -> std::result::Result<(), PolicyValidationError> {
        if !(1..=1440).contains(&self.min_ttl_minutes) {
            return Err(PolicyValidationError::MinTtlOutOfRange(self.min_ttl_minutes));
        }
        if !(1..=10).contains(&self.max_interactive_attempts) {
            return Err(PolicyValidationError::AttemptsOutOfRange(
                self.max_interactive_attempts,
            ));
        }
        Ok(())
    }
}

/// Options for a single connect call
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    /// Open a new session even if one to the same address exists
    pub force_reconnect: bool,

    /// Credentials file overriding the one configured for the endpoint
    pub credential_file: Option<PathBuf>,
}

impl ConnectOptions {
    pub fn forced() -> Self {
        Self {
            force_reconnect: true,
            credential_file: None,
        }
    }
}

/// What `ensure_healthy_connection` did
#[derive(Debug, Clone, PartialEq)]
pub enum HealthOutcome {
    /// Token or probe showed a usable session, nothing was done
    Healthy,
    /// The token was about to expire and a new session was opened from cache
    SilentlyReconnected,
    /// The token was about to expire and re-authenticating from cache failed
    SilentReconnectFailed(String),
    /// The session was gone and a full connect replaced it
    Reconnected,
    /// The probe failed for a reason a new login would not fix
    ProbeFailed(String),
}

/// Log an authentication failure with operator guidance
fn report_failure(kind: EndpointKind, address: &str, e: &SdkError) {
    error!(kind = ?e.kind, "Failed to connect to {} {}", kind, address);
    match e.kind {
        SdkErrorKind::Unknown => error!("error message: {}", e.message),
        other => {
            error!("{}", other.guidance());
            debug!("error message: {}", e.message);
        }
    }
}

impl<S: VirtualizationSdk> SessionContext<S> {
    /// Connect the `kind` endpoint
    ///
    /// # Errors
    ///
    /// Configuration errors (unreadable or incomplete credentials) are
    /// returned before any login is attempted. A failed login with file
    /// credentials is returned at once; with operator input it is retried
    /// until the operator declines or `max_interactive_attempts` is reached.
    pub fn connect(
        &mut self,
        kind: EndpointKind,
        options: &ConnectOptions,
        prompter: &mut dyn Prompter,
    ) -> Result<ConnectionHandle> {
        let watch = Stopwatch::start(format!("connect to {}", kind));

        if options.force_reconnect && self.cache(kind).is_complete() {
            if let Ok(handle) = self.silent_reconnect(kind) {
                watch.finish();
                return Ok(handle);
            }
            info!("Falling back to a full connect for {}", kind);
        }

        let (mut credentials, origin) = self.resolve_credentials(kind, options, prompter)?;
        let max_attempts = self.policy.max_interactive_attempts.max(1);
        let mut attempt = 1;

        loop {
            let blank = credentials.blank_fields(&kind.credential_fields());
            if !blank.is_empty() {
                error!("Cannot connect to {}: empty values for {}", kind, blank.join(", "));
                return Err(ConfigError::EmptyFields { fields: blank }.into());
            }

            if !options.force_reconnect {
                if let Some(existing) = find_live_of_kind(&self.sdk, kind, &credentials.address) {
                    warn!(
                        "Already connected to {} as {}, not opening another session",
                        existing.endpoint_address, existing.username
                    );
                    self.endpoint_mut(kind).address = Some(existing.endpoint_address.clone());
                    self.set_state(kind, ConnectionState::Connected);
                    watch.finish();
                    return Ok(existing);
                }
            }

            info!(attempt, "Connecting to {} {} using {}", kind, credentials.address, origin);
            self.set_state(kind, ConnectionState::Connecting);

            let failure = match self.sdk.authenticate(kind, &credentials) {
                Ok(handle) => {
                    self.accept(kind, &credentials, &handle);
                    if origin == CredentialOrigin::Interactive {
                        self.offer_persist(kind, options, &credentials, prompter);
                    }
                    watch.finish();
                    return Ok(handle);
                }
                Err(e) => e,
            };

            report_failure(kind, &credentials.address, &failure);
            self.set_state(kind, ConnectionState::Failed(failure.message.clone()));
            let session_error = failure.into_session_error(&credentials.address);

            if origin != CredentialOrigin::Interactive {
                return Err(session_error.into());
            }
            if attempt >= max_attempts {
                error!("Giving up on {} after {} attempts", kind, attempt);
                return Err(session_error.into());
            }

            let retry = prompter
                .confirm("Retry with different credentials?", true)
                .map_err(|e| CredentialError::PromptFailed {
                    field: "retry".to_string(),
                    reason: e.to_string(),
                })?;
            if !retry {
                info!("Connect to {} cancelled", kind);
                return Err(SessionError::UserCancelled.into());
            }

            attempt += 1;
            credentials = prompt_credentials(prompter, kind)?;
        }
    }

    /// Re-authenticate the `kind` endpoint from cached credentials only
    ///
    /// Never prompts and never reads a file. On failure the cache and the
    /// state are left as they were.
    pub fn silent_reconnect(&mut self, kind: EndpointKind) -> Result<ConnectionHandle> {
        let credentials = self
            .cache(kind)
            .credentials()
            .ok_or(CredentialError::Incomplete { kind })?;

        let previous = self.state(kind).clone();
        self.set_state(kind, ConnectionState::Reconnecting);

        match self.sdk.authenticate(kind, &credentials) {
            Ok(handle) => {
                self.accept(kind, &credentials, &handle);
                info!("Reconnected to {} {} with cached credentials", kind, credentials.address);
                Ok(handle)
            }
            Err(e) => {
                warn!(
                    kind = ?e.kind,
                    "Silent reconnect to {} {} failed: {}",
                    kind, credentials.address, e.message
                );
                self.set_state(kind, previous);
                Err(e.into_session_error(&credentials.address).into())
            }
        }
    }

    /// Make sure the `kind` session is usable before a long operation
    pub fn ensure_healthy_connection(
        &mut self,
        kind: EndpointKind,
        prompter: &mut dyn Prompter,
    ) -> Result<HealthOutcome> {
        let threshold = f64::from(self.policy.min_ttl_minutes);

        match self.token_time_to_live(kind) {
            TokenTtl::Minutes(minutes) if minutes < threshold => {
                self.set_state(kind, ConnectionState::TokenExpiringSoon);
                crate::advisory!(
                    "{} token expires in {:.1} minutes (threshold {}), reconnecting",
                    kind,
                    minutes,
                    self.policy.min_ttl_minutes
                );
                match self.silent_reconnect(kind) {
                    Ok(_) => Ok(HealthOutcome::SilentlyReconnected),
                    Err(e) => Ok(HealthOutcome::SilentReconnectFailed(e.to_string())),
                }
            }
            TokenTtl::Minutes(minutes) => {
                debug!("{} token valid for {:.1} more minutes", kind, minutes);
                Ok(HealthOutcome::Healthy)
            }
            TokenTtl::NoToken | TokenTtl::DecodeFailed => self.probe_and_recover(kind, prompter),
        }
    }

    fn probe_and_recover(
        &mut self,
        kind: EndpointKind,
        prompter: &mut dyn Prompter,
    ) -> Result<HealthOutcome> {
        let failure = match self.current_handle(kind) {
            None => SdkError::new(
                SdkErrorKind::SessionInvalid,
                "You are not currently connected to any servers.",
            ),
            Some(handle) => {
                let watch = Stopwatch::start(format!("liveness probe of {}", handle.endpoint_address));
                let outcome = self.sdk.probe(&handle);
                watch.finish();
                match outcome {
                    Ok(()) => {
                        self.set_state(kind, ConnectionState::Connected);
                        return Ok(HealthOutcome::Healthy);
                    }
                    Err(e) => e,
                }
            }
        };

        self.set_state(kind, ConnectionState::ProbeFailed);

        if failure.kind.triggers_reconnect() {
            warn!("{} session unusable ({}), reconnecting", kind, failure.message);
            self.connect(kind, &ConnectOptions::forced(), prompter)?;
            return Ok(HealthOutcome::Reconnected);
        }

        warn!("{} probe failed: {}", kind, failure.kind.guidance());
        Ok(HealthOutcome::ProbeFailed(format!(
            "{}: {}",
            failure.kind.category(),
            failure.message
        )))
    }

    fn resolve_credentials(
        &self,
        kind: EndpointKind,
        options: &ConnectOptions,
        prompter: &mut dyn Prompter,
    ) -> Result<(EndpointCredentials, CredentialOrigin)> {
        let path = options
            .credential_file
            .clone()
            .or_else(|| self.credential_file(kind).map(PathBuf::from));

        if let Some(path) = path.as_deref().filter(|p| p.exists()) {
            return Ok((load_credentials(kind, path)?, CredentialOrigin::File));
        }

        if self.policy.non_interactive {
            let path = path
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<no credentials file configured>".to_string());
            error!("No {} credentials file at {} and prompting is disabled", kind, path);
            return Err(ConfigError::CredentialsUnavailable { kind, path }.into());
        }

        if let Some(path) = &path {
            crate::advisory!("No credentials file at {}, asking for {} credentials", path.display(), kind);
        }
        Ok((prompt_credentials(prompter, kind)?, CredentialOrigin::Interactive))
    }

    /// Record a successful login
    fn accept(&mut self, kind: EndpointKind, credentials: &EndpointCredentials, handle: &ConnectionHandle) {
        self.retire_stale_handles(handle);

        let endpoint = self.endpoint_mut(kind);
        endpoint.cache.store(credentials);
        endpoint.address = Some(handle.endpoint_address.clone());
        self.set_state(kind, ConnectionState::Connected);

        info!(
            "Connected to {} {} as {} (version {})",
            kind, handle.endpoint_address, handle.username, handle.product_version
        );
    }

    /// Close older sessions of the same kind to the address `current` now serves
    fn retire_stale_handles(&mut self, current: &ConnectionHandle) {
        let stale: Vec<ConnectionHandle> = self
            .sdk
            .connections()
            .into_iter()
            .filter(|h| {
                h.id != current.id && h.kind == current.kind && h.is_live_for(&current.endpoint_address)
            })
            .collect();

        for handle in stale {
            debug!("Closing superseded session {} to {}", handle.id, handle.endpoint_address);
            if let Err(e) = self.sdk.disconnect(&handle) {
                warn!("Could not close superseded session to {}: {}", handle.endpoint_address, e);
            }
        }
    }

    /// Offer to save operator-entered credentials, declined by default
    fn offer_persist(
        &self,
        kind: EndpointKind,
        options: &ConnectOptions,
        credentials: &EndpointCredentials,
        prompter: &mut dyn Prompter,
    ) {
        let path = match options
            .credential_file
            .clone()
            .or_else(|| self.credential_file(kind).map(PathBuf::from))
        {
            Some(path) => path,
            None => return,
        };

        let question = format!(
            "Save these credentials to {} in plaintext for next time?",
            path.display()
        );
        match prompter.confirm(&question, false) {
            Ok(true) => {
                if let Err(e) = save_plaintext(kind, &path, credentials) {
                    crate::exception!("Could not save {} credentials: {}", kind, e);
                }
            }
            Ok(false) => debug!("Credentials not saved"),
            Err(e) => warn!("Could not read answer, credentials not saved: {}", e),
        }
    }
}
