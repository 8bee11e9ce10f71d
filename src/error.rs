use thiserror::Error;

/// Failures at the backend boundary (HTTP, socket, payload decoding).
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("HTTP {status}")]
    Http { status: u16 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("channel closed")]
    Closed,
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ServiceError::Decode(e.to_string())
        } else {
            ServiceError::Transport(e.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be a number, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("{key} must be one of test|demo, got {value:?}")]
    InvalidMode { key: &'static str, value: String },
}
