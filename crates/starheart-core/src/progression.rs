//! Rules for which progress updates are accepted.

use crate::{Result, StoryError};
use serde::Deserialize;
use starheart_types::chapter;
use starheart_types::{ProgressPatch, SessionProgress};
use std::collections::HashSet;

/// How strictly updates are checked against the current record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressionRule {
    /// Accept any well-typed values; the client drives the story.
    #[default]
    Lenient,
    /// Only single forward steps, non-decreasing attempts, no duplicate
    /// clues, and completion only from the finale.
    Strict,
}

impl ProgressionRule {
    /// Check `patch` against the stored `current` record.
    pub fn check(&self, current: &SessionProgress, patch: &ProgressPatch) -> Result<()> {
        match self {
            ProgressionRule::Lenient => Ok(()),
            ProgressionRule::Strict => check_strict(current, patch),
        }
    }
}

fn check_strict(current: &SessionProgress, patch: &ProgressPatch) -> Result<()> {
    if let Some(next) = patch.current_chapter {
        if !chapter::is_known(next) {
            return Err(StoryError::validation(format!(
                "currentChapter {} is outside {}..={}",
                next,
                chapter::START,
                chapter::FINALE
            )));
        }
        if next != current.current_chapter && current.current_chapter.checked_add(1) != Some(next) {
            return Err(StoryError::validation(format!(
                "cannot move from chapter {} to {}",
                current.current_chapter, next
            )));
        }
    }

    if let Some(attempts) = patch.minigame_attempts {
        if attempts < current.minigame_attempts {
            return Err(StoryError::validation(format!(
                "minigameAttempts cannot decrease from {} to {}",
                current.minigame_attempts, attempts
            )));
        }
    }

    if let Some(clues) = &patch.clues_found {
        let mut seen = HashSet::new();
        if let Some(dup) = clues.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(StoryError::validation(format!("duplicate clue '{}'", dup)));
        }
    }

    match patch.is_complete {
        Some(false) if current.is_complete => {
            return Err(StoryError::validation("a completed story cannot be reopened"));
        }
        Some(true) => {
            let at = patch.current_chapter.unwrap_or(current.current_chapter);
            if at != chapter::FINALE {
                return Err(StoryError::validation(format!(
                    "isComplete requires chapter {}, session is at {}",
                    chapter::FINALE,
                    at
                )));
            }
        }
        _ => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use starheart_types::StoryPath;

    fn progress_at(chapter: i32) -> SessionProgress {
        SessionProgress {
            id: 1,
            session_id: "s".to_string(),
            current_chapter: chapter,
            minigame_attempts: 3,
            clues_found: vec![],
            is_complete: false,
            has_failed_heart: false,
            love_meter: 0,
            story_path: StoryPath::Standard,
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn test_lenient_accepts_anything() {
        let patch = ProgressPatch {
            current_chapter: Some(99),
            minigame_attempts: Some(0),
            is_complete: Some(true),
            ..Default::default()
        };
        assert!(ProgressionRule::Lenient.check(&progress_at(0), &patch).is_ok());
    }

    #[test]
    fn test_strict_single_forward_step() {
        let rule = ProgressionRule::Strict;
        assert!(rule.check(&progress_at(2), &ProgressPatch::chapter(3)).is_ok());
        assert!(rule.check(&progress_at(2), &ProgressPatch::chapter(2)).is_ok());
        assert!(rule.check(&progress_at(2), &ProgressPatch::chapter(4)).is_err());
        assert!(rule.check(&progress_at(2), &ProgressPatch::chapter(1)).is_err());
        assert!(rule.check(&progress_at(5), &ProgressPatch::chapter(6)).is_err());
    }

    #[test]
    fn test_strict_handles_out_of_range_stored_chapter() {
        let rule = ProgressionRule::Strict;
        assert!(rule.check(&progress_at(i32::MAX), &ProgressPatch::chapter(5)).is_err());
        assert!(rule.check(&progress_at(i32::MIN), &ProgressPatch::chapter(0)).is_err());
    }

    #[test]
    fn test_strict_attempts_never_decrease() {
        let rule = ProgressionRule::Strict;
        assert!(rule.check(&progress_at(2), &ProgressPatch::attempts(4)).is_ok());
        assert!(rule.check(&progress_at(2), &ProgressPatch::attempts(1)).is_err());
    }

    #[test]
    fn test_strict_rejects_duplicate_clues() {
        let patch = ProgressPatch::clues(vec!["bamboo".into(), "stone".into(), "bamboo".into()]);
        let err = ProgressionRule::Strict.check(&progress_at(4), &patch).unwrap_err();
        assert!(err.to_string().contains("bamboo"));
    }

    #[test]
    fn test_strict_completion_only_at_finale() {
        let rule = ProgressionRule::Strict;
        assert!(rule.check(&progress_at(4), &ProgressPatch::complete()).is_err());
        assert!(rule.check(&progress_at(5), &ProgressPatch::complete()).is_ok());

        let step_and_finish = ProgressPatch {
            current_chapter: Some(5),
            is_complete: Some(true),
            ..Default::default()
        };
        assert!(rule.check(&progress_at(4), &step_and_finish).is_ok());

        let mut done = progress_at(5);
        done.is_complete = true;
        let reopen = ProgressPatch {
            is_complete: Some(false),
            ..Default::default()
        };
        assert!(rule.check(&done, &reopen).is_err());
    }
}
