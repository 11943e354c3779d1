//! Story progress service: init, get, update and password verification.

use crate::{ProgressStore, ProgressionRule, Result, StoryError};
use starheart_types::policy::{PasswordPolicy, PASSWORD_ACCEPTED, PASSWORD_REJECTED};
use starheart_types::{NewProgress, ProgressPatch, SessionProgress, VerifyResponse};
use std::sync::Arc;
use tracing::{debug, info, warn};

const MAX_SESSION_ID_LEN: usize = 128;
const MAX_CLUE_LEN: usize = 64;
const MAX_CLUES: usize = 32;

/// Path segments taken by the static story routes.
const RESERVED_SESSION_IDS: [&str; 2] = ["init", "verify"];

/// Validates requests and applies them to the progress store.
pub struct ProgressService {
    store: Arc<ProgressStore>,
    rule: ProgressionRule,
    passwords: PasswordPolicy,
}

impl ProgressService {
    pub fn new(store: Arc<ProgressStore>, rule: ProgressionRule, passwords: PasswordPolicy) -> Self {
        Self {
            store,
            rule,
            passwords,
        }
    }

    pub fn store(&self) -> &Arc<ProgressStore> {
        &self.store
    }

    /// Get the session's progress, creating it at the start of the story if
    /// this id has not been seen before.
    pub fn init(&self, session_id: &str) -> Result<SessionProgress> {
        validate_session_id(session_id)?;

        if let Some(progress) = self.store.get(session_id)? {
            debug!(target: "starheart::service", "Resuming session {}", session_id);
            return Ok(progress);
        }

        match self.store.create(&NewProgress::starting(session_id)) {
            Ok(progress) => {
                info!(target: "starheart::service", "Started new session {}", session_id);
                Ok(progress)
            }
            Err(StoryError::SessionAlreadyExists(_)) => {
                // Another init for the same id won the insert.
                self.store
                    .get(session_id)?
                    .ok_or_else(|| StoryError::SessionNotFound(session_id.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    pub fn get(&self, session_id: &str) -> Result<SessionProgress> {
        self.store
            .get(session_id)?
            .ok_or_else(|| StoryError::SessionNotFound(session_id.to_string()))
    }

    /// Apply a partial update and return the full record.
    pub fn update(&self, session_id: &str, patch: &ProgressPatch) -> Result<SessionProgress> {
        validate_patch(patch)?;

        if self.rule == ProgressionRule::Strict {
            let current = self.get(session_id)?;
            self.rule.check(&current, patch).inspect_err(|e| {
                warn!(target: "starheart::service", "Rejected update for {}: {}", session_id, e);
            })?;
        }

        let updated = self.store.update(session_id, patch)?;
        debug!(
            target: "starheart::service",
            "Updated session {} ({})",
            session_id,
            patch.field_names().join(", ")
        );
        Ok(updated)
    }

    /// Check a finale password. Never touches the store; callers persist
    /// completion through [`ProgressService::update`].
    pub fn verify_password(&self, candidate: &str) -> Result<VerifyResponse> {
        if candidate.is_empty() {
            return Err(StoryError::validation("password must not be empty"));
        }

        let success = self.passwords.accepts(candidate);
        debug!(target: "starheart::service", "Password attempt accepted: {}", success);

        let message = if success {
            PASSWORD_ACCEPTED
        } else {
            PASSWORD_REJECTED
        };
        Ok(VerifyResponse {
            success,
            message: message.to_string(),
        })
    }
}

fn validate_session_id(session_id: &str) -> Result<()> {
    if session_id.trim().is_empty() {
        return Err(StoryError::validation("sessionId must not be empty"));
    }
    if session_id.len() > MAX_SESSION_ID_LEN {
        return Err(StoryError::validation(format!(
            "sessionId must be at most {} characters",
            MAX_SESSION_ID_LEN
        )));
    }
    if RESERVED_SESSION_IDS.contains(&session_id) {
        return Err(StoryError::validation(format!(
            "sessionId '{}' is reserved",
            session_id
        )));
    }
    Ok(())
}

fn validate_patch(patch: &ProgressPatch) -> Result<()> {
    if patch.is_empty() {
        return Err(StoryError::validation("update must contain at least one field"));
    }

    if let Some(clues) = &patch.clues_found {
        if clues.len() > MAX_CLUES {
            return Err(StoryError::validation(format!(
                "cluesFound holds at most {} entries",
                MAX_CLUES
            )));
        }
        for clue in clues {
            if clue.trim().is_empty() || clue.len() > MAX_CLUE_LEN {
                return Err(StoryError::validation(format!(
                    "clue ids must be 1 to {} characters",
                    MAX_CLUE_LEN
                )));
            }
        }
    }

    Ok(())
}
