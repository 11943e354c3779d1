//! Star's Heart server library - HTTP API for story session progress.
//!
//! Routes, configuration and application state live here, separate from
//! main.rs, so integration tests can build the same router.

pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod routes;
pub mod state;
pub mod sweeper;
