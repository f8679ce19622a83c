//! Error types for posture-guardian

use thiserror::Error;

/// Result type alias for posture-guardian operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while handling a detection
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed request payload
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Vision API call failed
    #[error("vision error: {0}")]
    Vision(String),

    /// No usable analysis could be obtained
    #[error("analysis unavailable: {0}")]
    AnalysisUnavailable(String),

    /// Detection record could not be written
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
