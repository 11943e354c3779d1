//! Retention of abandoned sessions.

use crate::{ProgressStore, Result};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use tracing::{debug, info};

/// Sessions untouched for longer than `max_age_days` are deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RetentionPolicy {
    /// Zero keeps sessions forever.
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u32,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_max_age_days() -> u32 {
    180
}

fn default_sweep_interval_secs() -> u64 {
    3600
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_age_days: default_max_age_days(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl RetentionPolicy {
    pub fn is_enabled(&self) -> bool {
        self.max_age_days > 0
    }

    /// Oldest `last_updated` that is kept, or `None` when disabled or when
    /// the window reaches past the representable date range.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if !self.is_enabled() {
            return None;
        }
        TimeDelta::try_days(i64::from(self.max_age_days)).and_then(|age| now.checked_sub_signed(age))
    }

    /// Delete expired sessions. Returns the number removed.
    pub fn sweep(&self, store: &ProgressStore, now: DateTime<Utc>) -> Result<usize> {
        let Some(cutoff) = self.cutoff(now) else {
            debug!(target: "starheart::retention", "No retention cutoff, skipping sweep");
            return Ok(0);
        };

        let removed = store.prune_older_than(cutoff)?;
        if removed > 0 {
            info!(target: "starheart::retention", "Pruned {} sessions idle since {}", removed, cutoff);
        } else {
            debug!(target: "starheart::retention", "No sessions idle since {}", cutoff);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use starheart_types::NewProgress;

    #[test]
    fn test_disabled_policy_has_no_cutoff() {
        let policy = RetentionPolicy {
            max_age_days: 0,
            ..Default::default()
        };
        assert!(policy.cutoff(Utc::now()).is_none());
    }

    #[test]
    fn test_huge_window_has_no_cutoff() {
        let policy = RetentionPolicy {
            max_age_days: u32::MAX,
            ..Default::default()
        };
        assert!(policy.cutoff(Utc::now()).is_none());

        let store = ProgressStore::open_in_memory().unwrap();
        store.create(&NewProgress::starting("kept")).unwrap();
        assert_eq!(policy.sweep(&store, Utc::now()).unwrap(), 0);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_cutoff_subtracts_window() {
        let now = Utc::now();
        let policy = RetentionPolicy {
            max_age_days: 30,
            ..Default::default()
        };
        assert_eq!(policy.cutoff(now), Some(now - Duration::days(30)));
    }

    #[test]
    fn test_sweep_keeps_recent_sessions() {
        let store = ProgressStore::open_in_memory().unwrap();
        store.create(&NewProgress::starting("recent")).unwrap();

        let policy = RetentionPolicy::default();
        assert_eq!(policy.sweep(&store, Utc::now()).unwrap(), 0);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_sweep_removes_expired_sessions() {
        let store = ProgressStore::open_in_memory().unwrap();
        store.create(&NewProgress::starting("stale")).unwrap();

        let policy = RetentionPolicy {
            max_age_days: 30,
            ..Default::default()
        };
        let later = Utc::now() + Duration::days(31);
        assert_eq!(policy.sweep(&store, later).unwrap(), 1);
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_disabled_sweep_removes_nothing() {
        let store = ProgressStore::open_in_memory().unwrap();
        store.create(&NewProgress::starting("stale")).unwrap();

        let policy = RetentionPolicy {
            max_age_days: 0,
            ..Default::default()
        };
        let later = Utc::now() + Duration::days(10_000);
        assert_eq!(policy.sweep(&store, later).unwrap(), 0);
    }
}
