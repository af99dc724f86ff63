//! HTTP adapter for controller and virtualization server REST APIs
//!
//! Controller: `POST /v1/tokens` issues a JWT access token, the product
//! version comes from `GET /v1/sddc-managers` and the liveness probe is
//! `GET /v1/domains`.
//!
//! Virtualization server: `POST /api/session` with basic auth issues a
//! session id, the version comes from `GET /api/appliance/system/version`,
//! the probe is `GET /api/vcenter/datacenter` and logout is
//! `DELETE /api/session`.

use crate::config::SdkConfig;
use crate::sdk::{classify, ConnectionHandle, SdkError, SdkErrorKind, VirtualizationSdk};
use crate::types::{EndpointCredentials, EndpointKind};
use chrono::Utc;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::Deserialize;
use std::error::Error as _;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const SESSION_HEADER: &str = "vmware-api-session-id";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenPair {
    access_token: String,
}

#[derive(Deserialize)]
struct PageOf<T> {
    #[serde(default = "Vec::new")]
    elements: Vec<T>,
}

#[derive(Deserialize)]
struct VersionInfo {
    version: String,
}

/// Which call a response belongs to; decides how HTTP 401 is read
#[derive(Clone, Copy, PartialEq, Eq)]
enum CallKind {
    Login,
    Session,
}

/// Blocking REST adapter
///
/// The adapter owns the registry of sessions it opened.
pub struct RestSdk {
    client: Client,
    registry: Vec<ConnectionHandle>,
    next_id: u64,
}

impl RestSdk {
    /// Create a new adapter
    ///
    /// # Errors
    ///
    /// Returns an [`SdkErrorKind::Environment`] error when the HTTP client
    /// cannot be built (for example when no TLS backend is usable).
    pub fn new(config: &SdkConfig) -> Result<Self, SdkError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .use_rustls_tls()
            .build()
            .map_err(|e| {
                SdkError::new(
                    SdkErrorKind::Environment,
                    format!("Failed to initialise HTTP client: {}", e),
                )
            })?;

        if config.accept_invalid_certs {
            warn!("TLS certificate validation is disabled for remote endpoints");
        }

        Ok(Self {
            client,
            registry: Vec::new(),
            next_id: 1,
        })
    }

    /// Base URL for an endpoint address; bare host names default to https
    pub fn base_url(address: &str) -> Result<Url, SdkError> {
        let candidate = if address.contains("://") {
            address.to_string()
        } else {
            format!("https://{}", address)
        };

        Url::parse(&candidate).map_err(|e| {
            SdkError::new(
                SdkErrorKind::Network,
                format!("Could not resolve endpoint address {}: {}", address, e),
            )
        })
    }

    fn url(address: &str, path: &str) -> Result<Url, SdkError> {
        Self::base_url(address)?.join(path).map_err(|e| {
            SdkError::new(SdkErrorKind::Unknown, format!("Invalid request path {}: {}", path, e))
        })
    }

    fn send(request: RequestBuilder, call: CallKind) -> Result<Response, SdkError> {
        let response = request.send().map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        Err(status_error(status, &body, call))
    }

    fn authorize(&self, request: RequestBuilder, handle: &ConnectionHandle) -> RequestBuilder {
        let token = handle.session_token.clone().unwrap_or_default();
        match handle.kind {
            EndpointKind::Controller => request.bearer_auth(token),
            EndpointKind::Hypervisor => request.header(SESSION_HEADER, token),
        }
    }

    fn login(&self, kind: EndpointKind, credentials: &EndpointCredentials) -> Result<String, SdkError> {
        match kind {
            EndpointKind::Controller => {
                let url = Self::url(&credentials.address, "/v1/tokens")?;
                let request = credentials.secret.with_exposed(|secret| {
                    self.client.post(url).json(&serde_json::json!({
                        "username": credentials.username,
                        "password": secret,
                    }))
                });
                let pair: TokenPair = Self::send(request, CallKind::Login)?
                    .json()
                    .map_err(|e| SdkError::from_raw(format!("Unexpected token response: {}", e)))?;
                Ok(pair.access_token)
            }
            EndpointKind::Hypervisor => {
                let url = Self::url(&credentials.address, "/api/session")?;
                let request = credentials.secret.with_exposed(|secret| {
                    self.client
                        .post(url)
                        .basic_auth(&credentials.username, Some(secret))
                });
                Self::send(request, CallKind::Login)?
                    .json::<String>()
                    .map_err(|e| SdkError::from_raw(format!("Unexpected session response: {}", e)))
            }
        }
    }

    fn product_version(&self, handle: &ConnectionHandle) -> Result<String, SdkError> {
        match handle.kind {
            EndpointKind::Controller => {
                let url = Self::url(&handle.endpoint_address, "/v1/sddc-managers")?;
                let page: PageOf<VersionInfo> =
                    Self::send(self.authorize(self.client.get(url), handle), CallKind::Session)?
                        .json()
                        .map_err(|e| SdkError::from_raw(format!("Unexpected version response: {}", e)))?;
                Ok(page
                    .elements
                    .into_iter()
                    .next()
                    .map(|info| info.version)
                    .unwrap_or_default())
            }
            EndpointKind::Hypervisor => {
                let url = Self::url(&handle.endpoint_address, "/api/appliance/system/version")?;
                let info: VersionInfo =
                    Self::send(self.authorize(self.client.get(url), handle), CallKind::Session)?
                        .json()
                        .map_err(|e| SdkError::from_raw(format!("Unexpected version response: {}", e)))?;
                Ok(info.version)
            }
        }
    }
}

impl VirtualizationSdk for RestSdk {
    fn authenticate(
        &mut self,
        kind: EndpointKind,
        credentials: &EndpointCredentials,
    ) -> Result<ConnectionHandle, SdkError> {
        let token = self.login(kind, credentials)?;

        let mut handle = ConnectionHandle {
            id: self.next_id,
            kind,
            endpoint_address: credentials.address.clone(),
            username: credentials.username.clone(),
            is_connected: true,
            product_version: String::new(),
            session_token: Some(token),
            start_time: Some(Utc::now()),
        };
        self.next_id += 1;

        handle.product_version = match self.product_version(&handle) {
            Ok(version) => version,
            Err(e) => {
                warn!("Unable to read product version from {}: {}", handle.endpoint_address, e);
                String::new()
            }
        };

        self.registry.push(handle.clone());
        Ok(handle)
    }

    fn disconnect(&mut self, handle: &ConnectionHandle) -> Result<(), SdkError> {
        if handle.kind == EndpointKind::Hypervisor {
            let url = Self::url(&handle.endpoint_address, "/api/session")?;
            match Self::send(self.authorize(self.client.delete(url), handle), CallKind::Session) {
                Ok(_) => {}
                Err(e) if e.kind == SdkErrorKind::SessionInvalid => {
                    debug!("Session to {} had already ended", handle.endpoint_address);
                }
                Err(e) => return Err(e),
            }
        }

        self.registry.retain(|h| h.id != handle.id);
        Ok(())
    }

    fn connections(&self) -> Vec<ConnectionHandle> {
        self.registry.clone()
    }

    fn probe(&mut self, handle: &ConnectionHandle) -> Result<(), SdkError> {
        let path = match handle.kind {
            EndpointKind::Controller => "/v1/domains",
            EndpointKind::Hypervisor => "/api/vcenter/datacenter",
        };
        let url = Self::url(&handle.endpoint_address, path)?;
        let response = Self::send(self.authorize(self.client.get(url), handle), CallKind::Session)?;

        let body: serde_json::Value = response
            .json()
            .map_err(|e| SdkError::from_raw(format!("Unexpected inventory response: {}", e)))?;
        let first = body
            .get("elements")
            .and_then(|elements| elements.get(0))
            .or_else(|| body.get(0));
        debug!(
            endpoint = %handle.endpoint_address,
            has_inventory = first.is_some(),
            "Liveness probe answered"
        );
        Ok(())
    }
}

/// Full error text of a transport failure, including its sources
fn transport_error(err: reqwest::Error) -> SdkError {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }

    let kind = match classify(&message) {
        SdkErrorKind::Unknown | SdkErrorKind::Network if err.is_timeout() => SdkErrorKind::Timeout,
        SdkErrorKind::Unknown if err.is_connect() => SdkErrorKind::Network,
        kind => kind,
    };
    SdkError::new(kind, message)
}

fn status_error(status: StatusCode, body: &str, call: CallKind) -> SdkError {
    match (status, call) {
        (StatusCode::UNAUTHORIZED, CallKind::Login) => SdkError::new(
            SdkErrorKind::Authentication,
            format!("Incorrect user name or password (HTTP {})", status.as_u16()),
        ),
        (StatusCode::UNAUTHORIZED, CallKind::Session) => SdkError::new(
            SdkErrorKind::SessionInvalid,
            format!("Session token not found or expired (HTTP {})", status.as_u16()),
        ),
        (StatusCode::FORBIDDEN, _) => SdkError::new(
            SdkErrorKind::Permission,
            format!("Permission denied (HTTP {}): {}", status.as_u16(), body.trim()),
        ),
        _ => SdkError::from_raw(format!("HTTP {}: {}", status.as_u16(), body.trim())),
    }
}
