//! Error types for DocFinder.

use thiserror::Error;

/// Library-level error type for DocFinder operations.
#[derive(Error, Debug)]
pub enum DocFinderError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Embedding model error: {0}")]
    Model(String),

    #[error("Document processing failed: {0}")]
    Processing(String),

    #[error("Vector index error: {0}")]
    Index(String),

    #[error("Completion endpoint error: {0}")]
    Endpoint(#[from] EndpointFailure),

    #[error("Invalid state: {0}")]
    State(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Why a call to a remote HTTP endpoint failed.
#[derive(Error, Debug)]
pub enum EndpointFailure {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("{url} returned HTTP {status}: {body}")]
    Status { url: String, status: u16, body: String },

    #[error("unparseable response from {url}: {message}")]
    InvalidResponse { url: String, message: String },
}

impl EndpointFailure {
    /// Classify a reqwest error raised while talking to `url`.
    pub fn from_reqwest(url: &str, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else if err.is_decode() {
            Self::InvalidResponse {
                url: url.to_string(),
                message: err.to_string(),
            }
        } else {
            Self::Transport {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }

    /// HTTP status code, when the endpoint answered with one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for DocFinder operations.
pub type Result<T> = std::result::Result<T, DocFinderError>;
