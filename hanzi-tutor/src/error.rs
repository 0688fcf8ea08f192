//! Error types for hanzi-tutor
//!
//! Most failures inside a learning session are absorbed and turned into
//! feedback; these variants surface at the store, collaborator and API seams.

use thiserror::Error;

/// Main error type for hanzi-tutor
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Errors bubbled up from the shared crate
    #[error(transparent)]
    Common(#[from] hanzi_common::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode errors (ink, reference data, example words)
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Handwriting recognizer failed or returned garbage
    #[error("Recognizer error: {0}")]
    Recognizer(String),

    /// Audio capture/playback device unavailable or failed
    #[error("Audio device error: {0}")]
    AudioDevice(String),

    /// WAV or PCM payload could not be decoded
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Invalid state for operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Recognizer(e.to_string())
    }
}

impl From<hound::Error> for Error {
    fn from(e: hound::Error) -> Self {
        Error::Decode(e.to_string())
    }
}

/// Convenience Result type using hanzi-tutor Error
pub type Result<T> = std::result::Result<T, Error>;
