//! Per-install session identity.

use crate::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// The opaque token the server knows this player by.
///
/// Resolved once at startup and handed to [`crate::StoryClient`]; nothing
/// reads it from global state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    session_id: String,
}

impl SessionIdentity {
    /// Read the id stored at `path`, generating and saving a new one when the
    /// file is missing or empty.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) if !content.trim().is_empty() => {
                let session_id = content.trim().to_string();
                debug!(target: "starheart::client", "Loaded session id from {}", path.display());
                return Ok(Self { session_id });
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let identity = Self::generate();
        std::fs::write(path, &identity.session_id)?;
        info!(target: "starheart::client", "Created new session id at {}", path.display());
        Ok(identity)
    }

    /// Default location of the stored id.
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("starheart")
            .join("session_id")
    }

    /// A fresh random id that is not persisted.
    pub fn generate() -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn from_id(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}
