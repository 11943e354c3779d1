//! Progress persistence and the story progress service.

mod db;
mod error;
mod progression;
mod retention;
mod service;

pub use db::ProgressStore;
pub use error::StoryError;
pub use progression::ProgressionRule;
pub use retention::RetentionPolicy;
pub use service::ProgressService;

/// Result type for story operations.
pub type Result<T> = std::result::Result<T, StoryError>;
