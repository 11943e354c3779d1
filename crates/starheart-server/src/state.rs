//! Shared application state.

use crate::config::Config;
use starheart_core::{ProgressService, ProgressStore};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub service: Arc<ProgressService>,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> starheart_core::Result<Self> {
        let store = Arc::new(ProgressStore::open(&config.db_path)?);
        let service = Arc::new(ProgressService::new(
            store,
            config.progression,
            config.password_policy(),
        ));

        Ok(Self { service, config })
    }
}
