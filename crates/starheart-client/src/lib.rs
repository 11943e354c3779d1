//! Client session manager for The Star's Heart.
//!
//! Resolves a stable per-install session id, wraps the story API, and keeps
//! the latest server copy of the progress for views to read between calls.

mod client;
mod error;
mod identity;
mod play;

pub use client::{ClientConfig, StoryClient};
pub use error::ClientError;
pub use identity::SessionIdentity;
pub use play::TraceOutcome;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
