//! Error types for the station

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum Error {
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures talking to the generation service
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Handshake failed: {0}")]
    Handshake(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Receive failed: {0}")]
    ReceiveFailed(String),

    #[error("Timeout")]
    Timeout,

    #[error("Incomplete batch: received {received} of {expected} payloads")]
    IncompleteBatch { received: usize, expected: usize },

    #[error("Slot write failed: {0}")]
    Slot(#[from] SlotError),

    #[error("Generation task failed: {0}")]
    TaskFailed(String),
}

/// Slot store errors
#[derive(Error, Debug)]
pub enum SlotError {
    #[error("Slot out of range: {0}")]
    OutOfRange(u8),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, Error>;
