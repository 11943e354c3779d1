//! Story actions built on the progress API.
//!
//! Each helper judges the player's input with the policies in
//! [`starheart_types::policy`] and persists the outcome as a partial update.

use crate::{ClientError, Result, StoryClient};
use starheart_types::chapter;
use starheart_types::policy::{self, ClueGate, ConstellationPolicy};
use starheart_types::{ProgressPatch, SessionProgress, VerifyResponse};
use tracing::debug;

/// Result of tracing the constellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceOutcome {
    /// The heart was traced; the story moved on to the next chapter.
    Traced,
    /// Not enough stars connected.
    Missed { attempts: u32, show_guide: bool },
}

impl StoryClient {
    async fn loaded(&mut self) -> Result<SessionProgress> {
        if let Some(progress) = self.progress() {
            return Ok(progress.clone());
        }
        Ok(self.ensure_session().await?.clone())
    }

    pub async fn advance_to(&mut self, chapter: i32) -> Result<&SessionProgress> {
        debug!(target: "starheart::client", "Advancing to {}", chapter::title(chapter));
        self.update(&ProgressPatch::chapter(chapter)).await
    }

    /// Judge a traced path of star indices and record the outcome.
    pub async fn submit_trace(&mut self, path: &[usize]) -> Result<TraceOutcome> {
        if ConstellationPolicy::default().evaluate(path) {
            self.advance_to(chapter::VOICE).await?;
            return Ok(TraceOutcome::Traced);
        }

        let attempts = self.loaded().await?.minigame_attempts + 1;
        self.update(&ProgressPatch::attempts(attempts)).await?;
        Ok(TraceOutcome::Missed {
            attempts,
            show_guide: policy::shows_trace_guide(attempts),
        })
    }

    /// Record a discovered clue. Returns false if it was already found.
    pub async fn collect_clue(&mut self, clue: &str) -> Result<bool> {
        let mut clues = self.loaded().await?.clues_found;
        if clues.iter().any(|c| c == clue) {
            return Ok(false);
        }

        clues.push(clue.to_string());
        self.update(&ProgressPatch::clues(clues)).await?;
        Ok(true)
    }

    /// Whether enough clues are found to open the finale.
    pub fn clues_complete(&self) -> bool {
        self.progress()
            .is_some_and(|p| ClueGate::default().is_open(&p.clues_found))
    }

    /// Whether the tracing guide outline should be shown.
    pub fn show_trace_guide(&self) -> bool {
        self.progress()
            .is_some_and(|p| policy::shows_trace_guide(p.minigame_attempts))
    }

    pub async fn enter_finale(&mut self) -> Result<&SessionProgress> {
        if !self.clues_complete() {
            let found = self.progress().map_or(0, |p| p.clues_found.len());
            return Err(ClientError::Gate(format!(
                "{} of {} clues found",
                found,
                ClueGate::default().required
            )));
        }
        self.advance_to(chapter::FINALE).await
    }

    /// Speak the finale password; marks the story complete when accepted.
    pub async fn speak_password(&mut self, password: &str) -> Result<VerifyResponse> {
        let result = self.verify(password).await?;
        if result.success {
            self.update(&ProgressPatch::complete()).await?;
        }
        Ok(result)
    }
}
