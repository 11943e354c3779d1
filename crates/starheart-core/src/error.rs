//! Error types for story progress.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoryError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session already exists: {0}")]
    SessionAlreadyExists(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store lock poisoned")]
    LockPoisoned,
}

impl StoryError {
    pub fn validation(message: impl Into<String>) -> Self {
        StoryError::Validation(message.into())
    }
}
