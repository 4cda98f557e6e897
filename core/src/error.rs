//! Error types for the calendar API client.
//!
//! # Design
//! The backend answers every failure with a `{ ok: false, msg }` envelope, so
//! the status-derived variants keep the server's `msg` around. Callers never
//! see these errors directly; the state containers reduce them to a display
//! string through [`ApiError::user_message`].

use thiserror::Error;

/// Errors produced while building requests, executing them or parsing their
/// responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 401: bad or expired token, or the event belongs to someone else.
    #[error("unauthorized: {msg}")]
    Unauthorized { msg: String },

    /// 404: the event id does not exist on the server.
    #[error("not found: {msg}")]
    NotFound { msg: String },

    /// Any other non-2xx status (bad credentials, duplicate user, invalid
    /// event payload, server errors).
    #[error("HTTP {status}: {msg}")]
    Rejected { status: u16, msg: String },

    /// The request never produced a response.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// A wire date string could not be parsed.
    #[error("invalid date {0:?}")]
    InvalidDate(String),
}

impl ApiError {
    /// Reduce the error to a message suitable for an error banner.
    ///
    /// Server-provided messages win; transport and codec failures fall back
    /// to a generic sentence.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized { msg }
            | ApiError::NotFound { msg }
            | ApiError::Rejected { msg, .. }
                if !msg.is_empty() =>
            {
                msg.clone()
            }
            ApiError::Unauthorized { .. } => "Not authorized".to_string(),
            ApiError::NotFound { .. } => "Event not found".to_string(),
            ApiError::Transport(_) => "Could not reach the server".to_string(),
            _ => "Unexpected error, please try again".to_string(),
        }
    }
}

/// Errors raised by [`crate::storage::FileStorage`].
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Errors raised while loading [`crate::config::ClientConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("parsing config: {0}")]
    Parse(#[from] toml::de::Error),
}
