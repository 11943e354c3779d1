//! Gameplay checks for the minigames.
//!
//! These are deliberately loose stand-ins: the finale password is a substring
//! match against a list of phrases and the constellation only needs enough
//! distinct stars. They live here so transport and storage never depend on
//! how a puzzle is judged.

use std::collections::HashSet;

/// Phrases accepted at the final lock.
pub const DEFAULT_PHRASES: [&str; 6] = [
    "i love you",
    "the moon is beautiful",
    "moon is beautiful",
    "eternal love",
    "my love",
    "found you",
];

pub const PASSWORD_ACCEPTED: &str = "The memory returns...";
pub const PASSWORD_REJECTED: &str = "That doesn't feel quite right.";

/// Failed tracing attempts after which the guide outline is shown.
pub const GUIDE_AFTER_ATTEMPTS: u32 = 5;

/// Accepts a candidate when its normalized form contains any phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordPolicy {
    phrases: Vec<String>,
}

impl PasswordPolicy {
    /// Build a policy from custom phrases. Blank phrases are dropped, since
    /// they would match every input.
    pub fn from_phrases<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let phrases = phrases
            .into_iter()
            .map(|p| normalize(p.as_ref()))
            .filter(|p| !p.is_empty())
            .collect();
        Self { phrases }
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    pub fn accepts(&self, candidate: &str) -> bool {
        let normalized = normalize(candidate);
        self.phrases.iter().any(|p| normalized.contains(p.as_str()))
    }
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self::from_phrases(DEFAULT_PHRASES)
    }
}

/// Lowercase and trim surrounding whitespace.
pub fn normalize(candidate: &str) -> String {
    candidate.trim().to_lowercase()
}

/// A traced constellation succeeds once enough distinct stars are connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstellationPolicy {
    pub min_points: usize,
}

impl ConstellationPolicy {
    pub fn evaluate(&self, path: &[usize]) -> bool {
        let distinct: HashSet<usize> = path.iter().copied().collect();
        distinct.len() >= self.min_points
    }
}

impl Default for ConstellationPolicy {
    fn default() -> Self {
        Self { min_points: 6 }
    }
}

/// Opens the way to the finale once enough clues are found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClueGate {
    pub required: usize,
}

impl ClueGate {
    pub fn is_open(&self, clues: &[String]) -> bool {
        let distinct: HashSet<&str> = clues.iter().map(String::as_str).collect();
        distinct.len() >= self.required
    }
}

impl Default for ClueGate {
    fn default() -> Self {
        Self { required: 4 }
    }
}

pub fn shows_trace_guide(attempts: u32) -> bool {
    attempts >= GUIDE_AFTER_ATTEMPTS
}
