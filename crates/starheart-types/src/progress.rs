//! Session progress record and partial updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Narrative branch a session is following.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryPath {
    /// The main storyline.
    #[default]
    Standard,
    /// Taken after failing the heart constellation.
    Sadness,
    Imprisoned,
    Moon,
    Escape,
}

impl StoryPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoryPath::Standard => "standard",
            StoryPath::Sadness => "sadness",
            StoryPath::Imprisoned => "imprisoned",
            StoryPath::Moon => "moon",
            StoryPath::Escape => "escape",
        }
    }
}

impl fmt::Display for StoryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown story path: {0}")]
pub struct UnknownStoryPath(pub String);

impl FromStr for StoryPath {
    type Err = UnknownStoryPath;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(StoryPath::Standard),
            "sadness" => Ok(StoryPath::Sadness),
            "imprisoned" => Ok(StoryPath::Imprisoned),
            "moon" => Ok(StoryPath::Moon),
            "escape" => Ok(StoryPath::Escape),
            other => Err(UnknownStoryPath(other.to_string())),
        }
    }
}

/// Persisted progress of one playthrough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProgress {
    /// Row identifier assigned by the store.
    pub id: i64,
    /// Client-generated session token.
    pub session_id: String,
    /// Narrative position, see [`crate::chapter`].
    pub current_chapter: i32,
    /// Failed attempts at the constellation minigame.
    pub minigame_attempts: u32,
    /// Identifiers of discovered clues.
    pub clues_found: Vec<String>,
    /// Set once the finale password has been accepted.
    pub is_complete: bool,
    pub has_failed_heart: bool,
    pub love_meter: i32,
    pub story_path: StoryPath,
    /// Stamped by the server on every mutation.
    pub last_updated: DateTime<Utc>,
}

/// Values for a new progress row. Omitted fields take their defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewProgress {
    pub session_id: String,
    pub current_chapter: Option<i32>,
    pub minigame_attempts: Option<u32>,
    pub clues_found: Option<Vec<String>>,
    pub is_complete: Option<bool>,
    pub has_failed_heart: Option<bool>,
    pub love_meter: Option<i32>,
    pub story_path: Option<StoryPath>,
}

impl NewProgress {
    /// A fresh playthrough at the start of the story.
    pub fn starting(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            current_chapter: Some(crate::chapter::START),
            minigame_attempts: Some(0),
            clues_found: Some(Vec::new()),
            is_complete: Some(false),
            ..Default::default()
        }
    }
}

/// Partial update to a progress record.
///
/// Only present fields are written; a present `cluesFound` replaces the whole
/// array. Unknown fields are rejected when deserializing, which also keeps
/// clients from supplying `lastUpdated`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProgressPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_chapter: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minigame_attempts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clues_found: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_complete: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_failed_heart: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub love_meter: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_path: Option<StoryPath>,
}

impl ProgressPatch {
    pub fn chapter(chapter: i32) -> Self {
        Self {
            current_chapter: Some(chapter),
            ..Default::default()
        }
    }

    pub fn attempts(attempts: u32) -> Self {
        Self {
            minigame_attempts: Some(attempts),
            ..Default::default()
        }
    }

    pub fn clues(clues: Vec<String>) -> Self {
        Self {
            clues_found: Some(clues),
            ..Default::default()
        }
    }

    pub fn complete() -> Self {
        Self {
            is_complete: Some(true),
            ..Default::default()
        }
    }

    /// True when no field is present.
    pub fn is_empty(&self) -> bool {
        self.current_chapter.is_none()
            && self.minigame_attempts.is_none()
            && self.clues_found.is_none()
            && self.is_complete.is_none()
            && self.has_failed_heart.is_none()
            && self.love_meter.is_none()
            && self.story_path.is_none()
    }

    /// Names of the present fields, in wire form.
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.current_chapter.is_some() {
            names.push("currentChapter");
        }
        if self.minigame_attempts.is_some() {
            names.push("minigameAttempts");
        }
        if self.clues_found.is_some() {
            names.push("cluesFound");
        }
        if self.is_complete.is_some() {
            names.push("isComplete");
        }
        if self.has_failed_heart.is_some() {
            names.push("hasFailedHeart");
        }
        if self.love_meter.is_some() {
            names.push("loveMeter");
        }
        if self.story_path.is_some() {
            names.push("storyPath");
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_patch_rejects_unknown_fields() {
        let result: Result<ProgressPatch, _> =
            serde_json::from_value(json!({ "currentChapter": 2, "lastUpdated": "2024-01-01T00:00:00Z" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_patch_rejects_wrong_types() {
        let result: Result<ProgressPatch, _> =
            serde_json::from_value(json!({ "isComplete": "yes" }));
        assert!(result.is_err());

        let result: Result<ProgressPatch, _> =
            serde_json::from_value(json!({ "minigameAttempts": -1 }));
        assert!(result.is_err());

        let result: Result<ProgressPatch, _> =
            serde_json::from_value(json!({ "cluesFound": [1, 2] }));
        assert!(result.is_err());
    }

    #[test]
    fn test_patch_partial_fields() {
        let patch: ProgressPatch =
            serde_json::from_value(json!({ "cluesFound": ["bamboo"], "storyPath": "moon" })).unwrap();
        assert_eq!(patch.clues_found, Some(vec!["bamboo".to_string()]));
        assert_eq!(patch.story_path, Some(StoryPath::Moon));
        assert!(patch.current_chapter.is_none());
        assert_eq!(patch.field_names(), vec!["cluesFound", "storyPath"]);
    }

    #[test]
    fn test_patch_serializes_only_present_fields() {
        let value = serde_json::to_value(ProgressPatch::chapter(3)).unwrap();
        assert_eq!(value, json!({ "currentChapter": 3 }));
    }

    #[test]
    fn test_empty_patch() {
        assert!(ProgressPatch::default().is_empty());
        assert!(!ProgressPatch::complete().is_empty());
    }

    #[test]
    fn test_story_path_round_trip_names() {
        for path in [
            StoryPath::Standard,
            StoryPath::Sadness,
            StoryPath::Imprisoned,
            StoryPath::Moon,
            StoryPath::Escape,
        ] {
            assert_eq!(path.as_str().parse::<StoryPath>().unwrap(), path);
        }
        assert!("lost".parse::<StoryPath>().is_err());
    }

    #[test]
    fn test_progress_wire_names_are_camel_case() {
        let progress = SessionProgress {
            id: 1,
            session_id: "abc".to_string(),
            current_chapter: 0,
            minigame_attempts: 0,
            clues_found: vec![],
            is_complete: false,
            has_failed_heart: false,
            love_meter: 0,
            story_path: StoryPath::Standard,
            last_updated: Utc::now(),
        };
        let value = serde_json::to_value(&progress).unwrap();
        assert_eq!(value["sessionId"], "abc");
        assert_eq!(value["currentChapter"], 0);
        assert_eq!(value["cluesFound"], json!([]));
        assert_eq!(value["isComplete"], false);
        assert_eq!(value["storyPath"], "standard");
        assert!(value.get("lastUpdated").is_some());
    }
}
