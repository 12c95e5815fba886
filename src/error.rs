//! Error types for the whoiswho game

use thiserror::Error;

/// Result type alias for whoiswho operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur outside the dialogue layer
///
/// Dialogue failures have their own taxonomy, see [`crate::dialogue::DialogueError`].
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Speech recognition facade error
    #[error("voice error: {0}")]
    Voice(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Controller inbox or event channel closed
    #[error("channel error: {0}")]
    Channel(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
