//! Background retention sweep.

use crate::state::AppState;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Periodically delete sessions past the retention window.
/// Returns `None` when retention is disabled.
pub fn spawn_retention_sweeper(state: Arc<AppState>) -> Option<JoinHandle<()>> {
    let policy = state.config.retention;
    if !policy.is_enabled() {
        info!(target: "starheart::retention", "Session retention disabled, rows are kept forever");
        return None;
    }

    info!(
        target: "starheart::retention",
        "Pruning sessions idle for {} days, checking every {}s",
        policy.max_age_days,
        policy.sweep_interval_secs
    );

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(policy.sweep_interval_secs.max(1)));
        loop {
            ticker.tick().await;
            if let Err(e) = policy.sweep(state.service.store(), chrono::Utc::now()) {
                warn!(target: "starheart::retention", "Retention sweep failed: {}", e);
            }
        }
    }))
}
