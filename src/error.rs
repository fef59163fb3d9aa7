//! Error types for mailstash.

use std::path::PathBuf;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Mail client error: {0}")]
    Client(#[from] ClientError),

    #[error("Message {id}: {source}")]
    MessageBody {
        id: String,
        #[source]
        source: ExtractError,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors talking to the remote mail provider.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("Provider rejected credentials (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("Provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response from {url}: {reason}")]
    Malformed { url: String, reason: String },
}

/// Errors turning an encoded payload into text.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Payload is not valid base64url: {0}")]
    Decode(#[from] base64::DecodeError),
}

/// Persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Record not found: {id}")]
    NotFound { id: String },

    #[error("Invalid record id: {id:?}")]
    InvalidId { id: String },

    #[error("Record id {record_id:?} does not match its key {key:?}")]
    KeyMismatch { key: String, record_id: String },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for mailstash.
pub type Result<T> = std::result::Result<T, Error>;
