/*
[INPUT]:  Error sources (provider HTTP, data layer, session cache, configuration)
[OUTPUT]: Structured error type with retry hints and user-facing messages
[POS]:    Error handling layer - unified error type for the rewards crate
[UPDATE]: When adding new error sources or changing login failure classification
*/

use reqwest::StatusCode;
use thiserror::Error;

use crate::auth::LoginFailure;

/// Main error type for the rewards client core
#[derive(Error, Debug)]
pub enum RewardsError {
    /// Static configuration is missing or still a placeholder
    #[error("Configuration error: {0}")]
    Config(String),

    /// The auth gateway has not finished initializing
    #[error("Authentication service is still initializing. Please wait a moment and try again.")]
    NotReady,

    /// Another login is still waiting on the identity provider
    #[error("A login is already in progress. Please wait.")]
    LoginInProgress,

    /// Initialization of the identity provider failed
    #[error("Initialization failed after {attempts} attempt(s): {message}")]
    Initialization { attempts: u32, message: String },

    /// The identity provider rejected or failed an operation
    #[error("Identity provider error: {0}")]
    Provider(String),

    /// A login attempt failed; carries the classified cause
    #[error("{}", .0.user_message())]
    Login(LoginFailure),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote service returned an error response
    #[error("API error (code {code}): {message}")]
    Api { code: u16, message: String },

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// SQLite statement failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Connection pool could not hand out a connection
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Local session cache could not be read or written
    #[error("Session storage error: {0}")]
    Storage(String),

    /// A stored value could not be decoded
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Operation aborted by a cancellation token
    #[error("Operation cancelled")]
    Cancelled,
}

impl RewardsError {
    /// Check if the error is worth retrying
    pub fn is_retryable(&self) -> bool {
        match self {
            RewardsError::Http(_) | RewardsError::Pool(_) | RewardsError::Provider(_) => true,
            RewardsError::Api { code, .. } => *code == 429 || *code >= 500,
            RewardsError::Login(failure) => failure.is_transient(),
            _ => false,
        }
    }

    /// Create an API error from status code and message
    pub fn api_error(status: StatusCode, message: impl Into<String>) -> Self {
        RewardsError::Api {
            code: status.as_u16(),
            message: message.into(),
        }
    }

    /// Message suitable for showing to the user in a status line
    pub fn user_message(&self) -> String {
        match self {
            RewardsError::Login(failure) => failure.user_message(),
            RewardsError::Config(_) => {
                "Authentication configuration error. Please contact support.".to_string()
            }
            RewardsError::Initialization { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<std::io::Error> for RewardsError {
    fn from(err: std::io::Error) -> Self {
        RewardsError::Storage(err.to_string())
    }
}

/// Result type alias for rewards operations
pub type Result<T> = std::result::Result<T, RewardsError>;
