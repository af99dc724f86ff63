//! Endpoint connection state machine
//!
//! `Disconnected -> Connecting -> Connected -> (TokenExpiringSoon | ProbeFailed)
//! -> Reconnecting -> Connected | Failed`

/// Connection states for one endpoint
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Not connected
    #[default]
    Disconnected,

    /// Attempting to establish connection
    Connecting,

    /// Successfully connected
    Connected,

    /// Connected, but the bearer token is below the TTL threshold
    TokenExpiringSoon,

    /// Connected on record, but the liveness probe failed
    ProbeFailed,

    /// Re-authenticating an existing session
    Reconnecting,

    /// Connection could not be established
    Failed(String),
}

impl ConnectionState {
    /// Whether the endpoint is believed to hold a usable session
    pub fn is_connected(&self) -> bool {
        matches!(
            self,
            ConnectionState::Connected | ConnectionState::TokenExpiringSoon
        )
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::TokenExpiringSoon => write!(f, "token expiring soon"),
            ConnectionState::ProbeFailed => write!(f, "probe failed"),
            ConnectionState::Reconnecting => write!(f, "reconnecting"),
            ConnectionState::Failed(msg) => write!(f, "failed: {}", msg),
        }
    }
}
