//! Error types for the tunnel.

use thiserror::Error;

/// Result type alias for tunnel operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while accepting, connecting, or relaying.
#[derive(Error, Debug)]
pub enum Error {
    /// Bad endpoint string or unusable gateway schema
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed or unsupported proxy handshake bytes
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Network I/O error
    #[error("network error: {0}")]
    Network(#[from] std::io::Error),

    /// Outbound dial timeout
    #[error("connect timeout after {0}s")]
    Timeout(u64),
}

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a new protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Error::Protocol(msg.into())
    }

    /// Check if this error aborts only the current session.
    pub fn is_session_scoped(&self) -> bool {
        !matches!(self, Error::Config(_))
    }
}
