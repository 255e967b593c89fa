//! Error types and handling.

use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request failed (connection refused, timeout, bad status)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status and no usable body
    #[error("Unexpected status {0}")]
    Status(u16),

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// Server processed the request but reported a failure (`success: false`)
    #[error("{0}")]
    Server(String),

    /// No anti-forgery token available for a state-changing request
    #[error("Missing CSRF token")]
    MissingCsrfToken,

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Create a parse error with message
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a config error with message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a server-reported failure with message
    pub fn server(msg: impl Into<String>) -> Self {
        Self::Server(msg.into())
    }

    /// Whether the error is an application-level failure carrying a server message.
    pub fn is_server_failure(&self) -> bool {
        matches!(self, Self::Server(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}
