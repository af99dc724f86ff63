//! Bearer token inspection
//!
//! Controller sessions carry a JWT. Only the payload's `exp` claim is read;
//! the signature is never verified here, the endpoint does that.

use crate::error::TokenError;
use chrono::{DateTime, Local, TimeZone, Utc};
use data_encoding::BASE64;
use serde::Deserialize;
use tracing::{debug, error};

/// Claims read from a bearer token payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    /// Expiry in Unix seconds, UTC
    pub exp: i64,
}

/// Remaining lifetime of a session token
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenTtl {
    /// Minutes until expiry, negative once expired
    Minutes(f64),
    /// The session carries no token to evaluate
    NoToken,
    /// A token was present but could not be decoded
    DecodeFailed,
}

impl TokenTtl {
    /// Minutes remaining, when known
    pub fn minutes(&self) -> Option<f64> {
        match self {
            TokenTtl::Minutes(minutes) => Some(*minutes),
            TokenTtl::NoToken | TokenTtl::DecodeFailed => None,
        }
    }
}

impl std::fmt::Display for TokenTtl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenTtl::Minutes(minutes) => write!(f, "{:.1} minutes", minutes),
            TokenTtl::NoToken => write!(f, "no token"),
            TokenTtl::DecodeFailed => write!(f, "undecodable token"),
        }
    }
}

/// Translate a base64url segment to the standard alphabet and pad it
///
/// The result length is always `len + (4 - len % 4) % 4`.
pub fn pad_base64url(segment: &str) -> String {
    let mut padded: String = segment
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    let remainder = padded.len() % 4;
    if remainder != 0 {
        padded.extend(std::iter::repeat('=').take(4 - remainder));
    }
    padded
}

/// Decode the claims from the payload segment of a bearer token
pub fn decode_claims(token: &str) -> Result<TokenClaims, TokenError> {
    let payload = token
        .split('.')
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .ok_or(TokenError::MissingPayload)?;

    let bytes = BASE64
        .decode(pad_base64url(payload).as_bytes())
        .map_err(|e| TokenError::InvalidBase64 {
            reason: e.to_string(),
        })?;

    let text = String::from_utf8(bytes).map_err(|_| TokenError::InvalidUtf8)?;

    serde_json::from_str(&text).map_err(|e| TokenError::InvalidClaims {
        reason: e.to_string(),
    })
}

/// Expiry of the claims in the local time zone in effect right now
pub fn local_expiry(claims: &TokenClaims) -> Result<DateTime<Local>, TokenError> {
    Utc.timestamp_opt(claims.exp, 0)
        .single()
        .map(|expiry| expiry.with_timezone(&Local))
        .ok_or(TokenError::ExpiryOutOfRange { exp: claims.exp })
}

/// Minutes left before `token` expires
pub fn time_to_live(token: Option<&str>) -> TokenTtl {
    time_to_live_at(token, Utc::now())
}

/// Minutes left before `token` expires, evaluated at `now`
pub fn time_to_live_at(token: Option<&str>, now: DateTime<Utc>) -> TokenTtl {
    let token = match token.map(str::trim).filter(|t| !t.is_empty()) {
        Some(token) => token,
        None => {
            debug!("No session token to evaluate");
            return TokenTtl::NoToken;
        }
    };

    let expiry = match decode_claims(token).and_then(|claims| local_expiry(&claims)) {
        Ok(expiry) => expiry,
        Err(e) => {
            error!("Unable to decode session token: {}", e);
            return TokenTtl::DecodeFailed;
        }
    };

    let remaining = expiry.signed_duration_since(now.with_timezone(&Local));
    let minutes = remaining.num_milliseconds() as f64 / 60_000.0;
    debug!(expires_at = %expiry.format("%Y-%m-%d %H:%M:%S"), "Session token valid for {:.1} minutes", minutes);
    TokenTtl::Minutes(minutes)
}
