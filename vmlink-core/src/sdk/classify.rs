//! Classification of raw remote error text
//!
//! Remote APIs report failures as free text whose wording changes between
//! product releases. This is the only place that text is inspected; every
//! caller works with the resulting [`SdkErrorKind`].

use regex::Regex;
use std::sync::OnceLock;

/// Category of an adapter failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SdkErrorKind {
    /// Session token rejected, expired or unknown
    SessionInvalid,
    /// The request did not complete in time
    Timeout,
    /// Credentials were rejected
    Authentication,
    /// Credentials were accepted but lack a privilege
    Permission,
    /// DNS, routing or connection failure
    Network,
    /// TLS negotiation or certificate validation failure
    Certificate,
    /// The adapter itself could not be set up
    Environment,
    /// Anything not matched above
    Unknown,
}

impl SdkErrorKind {
    /// Whether a failed probe of this kind warrants a fresh login
    pub fn triggers_reconnect(&self) -> bool {
        matches!(self, SdkErrorKind::SessionInvalid | SdkErrorKind::Timeout)
    }

    /// Broad category used in connection test results
    pub fn category(&self) -> &'static str {
        match self {
            SdkErrorKind::SessionInvalid
            | SdkErrorKind::Authentication
            | SdkErrorKind::Permission => "authentication or session invalid",
            SdkErrorKind::Network | SdkErrorKind::Timeout | SdkErrorKind::Certificate => {
                "network or connection lost"
            }
            SdkErrorKind::Environment | SdkErrorKind::Unknown => "unknown error",
        }
    }

    /// Operator guidance for this failure
    pub fn guidance(&self) -> &'static str {
        match self {
            SdkErrorKind::SessionInvalid => {
                "The session is no longer valid. Reconnect to obtain a new session token."
            }
            SdkErrorKind::Timeout => {
                "The endpoint did not answer in time. Check that it is running and not overloaded."
            }
            SdkErrorKind::Authentication => {
                "The user name or password was rejected. Verify the credentials and that the account is not locked."
            }
            SdkErrorKind::Permission => {
                "The account authenticated but lacks the required privileges. Use an account with administrative rights."
            }
            SdkErrorKind::Network => {
                "The endpoint could not be reached. Verify the FQDN or IP address, DNS resolution and firewall rules."
            }
            SdkErrorKind::Certificate => {
                "The TLS certificate could not be validated. Trust the endpoint certificate or enable accept_invalid_certs."
            }
            SdkErrorKind::Environment => {
                "The endpoint adapter could not be initialised. Check the installation and TLS libraries."
            }
            SdkErrorKind::Unknown => "Review the error message for details.",
        }
    }
}

fn signatures() -> &'static [(SdkErrorKind, Regex)] {
    static SIGNATURES: OnceLock<Vec<(SdkErrorKind, Regex)>> = OnceLock::new();
    SIGNATURES.get_or_init(|| {
        let table: [(SdkErrorKind, &str); 7] = [
            (
                SdkErrorKind::SessionInvalid,
                r"(?i)jwt signature|signature (verification )?fail|token (has )?expired|expired token|token not found|not currently connected|session (is )?(not authenticated|expired|invalid)",
            ),
            (SdkErrorKind::Timeout, r"(?i)\btime(d)? ?out\b"),
            (
                SdkErrorKind::Certificate,
                r"(?i)certificate|x509|ssl|tls handshake|unknown issuer",
            ),
            (
                SdkErrorKind::Authentication,
                r"(?i)incorrect user ?name or password|invalid (user ?name|credentials|login)|authentication failed|login failed|cannot complete login",
            ),
            (
                SdkErrorKind::Permission,
                r"(?i)permission|forbidden|not authorized|insufficient privilege",
            ),
            (
                SdkErrorKind::Network,
                r"(?i)could not resolve|name resolution|no such host|dns|connection refused|unable to connect|unreachable|connection (reset|closed|aborted)|error sending request",
            ),
            (
                SdkErrorKind::Environment,
                r"(?i)not installed|module .* not (found|loaded)|failed to initiali[sz]e",
            ),
        ];

        table
            .iter()
            .filter_map(|(kind, pattern)| Regex::new(pattern).ok().map(|re| (*kind, re)))
            .collect()
    })
}

/// Classify raw error text, first matching signature wins
pub fn classify(message: &str) -> SdkErrorKind {
    signatures()
        .iter()
        .find(|(_, re)| re.is_match(message))
        .map(|(kind, _)| *kind)
        .unwrap_or(SdkErrorKind::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_invalid_signatures() {
        for message in [
            "JWT signature does not match locally computed signature",
            "The token has expired",
            "Token not found",
            "You are not currently connected to any servers",
        ] {
            assert_eq!(classify(message), SdkErrorKind::SessionInvalid, "{}", message);
        }
    }

    #[test]
    fn test_other_kinds() {
        assert_eq!(
            classify("Cannot complete login due to an incorrect user name or password."),
            SdkErrorKind::Authentication
        );
        assert_eq!(classify("The operation has timed out"), SdkErrorKind::Timeout);
        assert_eq!(
            classify("invalid peer certificate: UnknownIssuer"),
            SdkErrorKind::Certificate
        );
        assert_eq!(
            classify("Could not resolve host vc01.lab.local"),
            SdkErrorKind::Network
        );
        assert_eq!(classify("something odd happened"), SdkErrorKind::Unknown);
    }

    #[test]
    fn test_timeout_needs_whole_words() {
        for message in ["Request timeout", "connection timed out", "operation time out"] {
            assert_eq!(classify(message), SdkErrorKind::Timeout, "{}", message);
        }
        assert_eq!(classify("unexpected runtime output"), SdkErrorKind::Unknown);
        assert!(!classify("unexpected runtime output").triggers_reconnect());
    }

    #[test]
    fn test_reconnect_triggers() {
        assert!(SdkErrorKind::SessionInvalid.triggers_reconnect());
        assert!(SdkErrorKind::Timeout.triggers_reconnect());
        assert!(!SdkErrorKind::Network.triggers_reconnect());
    }
}
