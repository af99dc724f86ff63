//! Product version checks
//!
//! Versions are compared numerically, component by component. Missing
//! components count as zero, so `8.0` equals `8.0.0`. Anything after the
//! first `-`, `+` or space (build numbers, release tags) is ignored.

use super::SessionContext;
use crate::error::{ConfigError, Result, SessionError};
use crate::sdk::VirtualizationSdk;
use crate::types::EndpointKind;
use std::cmp::Ordering;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a dotted numeric version: {0:?}")]
pub struct InvalidVersion(pub String);

/// A dotted numeric product version
#[derive(Debug, Clone)]
pub struct ProductVersion {
    components: Vec<u64>,
    raw: String,
}

impl ProductVersion {
    pub fn components(&self) -> &[u64] {
        &self.components
    }
}

impl FromStr for ProductVersion {
    type Err = InvalidVersion;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let raw = s.trim();
        let numeric = raw
            .split(|c: char| c == '-' || c == '+' || c.is_whitespace())
            .next()
            .unwrap_or_default();

        let components = numeric
            .split('.')
            .map(|part| part.parse::<u64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| InvalidVersion(s.to_string()))?;

        Ok(Self {
            components,
            raw: raw.to_string(),
        })
    }
}

impl Ord for ProductVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        (0..len)
            .map(|i| {
                let left = self.components.get(i).copied().unwrap_or(0);
                let right = other.components.get(i).copied().unwrap_or(0);
                left.cmp(&right)
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for ProductVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ProductVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ProductVersion {}

impl std::fmt::Display for ProductVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl<S: VirtualizationSdk> SessionContext<S> {
    /// Fail unless the connected `kind` endpoint runs `minimum` or newer
    pub fn require_minimum_version(&self, kind: EndpointKind, minimum: &str) -> Result<ProductVersion> {
        let required: ProductVersion = minimum.parse().map_err(|e: InvalidVersion| {
            ConfigError::ValidationError {
                message: format!("minimum version: {}", e),
            }
        })?;

        let handle = self
            .current_handle(kind)
            .ok_or(SessionError::NotConnected { kind })?;

        let actual: ProductVersion =
            handle
                .product_version
                .parse()
                .map_err(|e: InvalidVersion| SessionError::OperationFailed {
                    reason: format!("{} reported {}", kind, e),
                })?;

        if actual < required {
            error!("{} {} runs {}, at least {} is required", kind, handle.endpoint_address, actual, required);
            return Err(SessionError::VersionTooOld {
                kind,
                actual: actual.to_string(),
                required: required.to_string(),
            }
            .into());
        }

        debug!("{} version {} satisfies {}", kind, actual, required);
        Ok(actual)
    }
}
