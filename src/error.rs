//! Client error types

use std::fmt;

/// Result type for backend operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors raised while talking to the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The request never produced a response (network unreachable, CORS, ...)
    Transport(String),
    /// The response body was not what we expected
    Decode(String),
    /// The backend answered with a status we have no handling for
    Status(u16),
    /// A browser API we depend on is missing
    Unavailable(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Transport(msg) => write!(f, "transport error: {}", msg),
            ClientError::Decode(msg) => write!(f, "decode error: {}", msg),
            ClientError::Status(code) => write!(f, "unexpected status: {}", code),
            ClientError::Unavailable(what) => write!(f, "not available: {}", what),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Decode(e.to_string())
    }
}

/// A view could not build an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewError(pub String);

impl fmt::Display for ViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view error: {}", self.0)
    }
}

impl std::error::Error for ViewError {}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Config JSON could not be parsed
    Parse(String),
    /// A value is out of range
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(msg) => write!(f, "invalid config: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "config value out of range: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
