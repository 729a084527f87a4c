//! Error types for the game engine.

use thiserror::Error;

/// Result type for game lifecycle and configuration operations
pub type GameResult<T> = Result<T, GameError>;

/// Errors surfaced by the engine.
///
/// Domain outcomes such as an illegal claim or a dropped key press are part of
/// normal play and never show up here.
#[derive(Debug, Error)]
pub enum GameError {
    /// A configuration value failed validation
    #[error("Invalid configuration for {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    /// Configuration file could not be read
    #[error("Failed to read configuration file {path}: {source}")]
    ConfigFile {
        path: String,
        source: std::io::Error,
    },

    /// Configuration file could not be parsed
    #[error("Malformed configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// The OS refused to start a game thread
    #[error("Failed to spawn thread: {0}")]
    ThreadSpawn(#[from] std::io::Error),

    /// A game thread panicked before it could be joined
    #[error("Thread {0} panicked")]
    ThreadPanicked(String),

    /// The game has already been joined
    #[error("Game is not running")]
    NotRunning,
}

impl GameError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
