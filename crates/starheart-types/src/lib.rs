//! Shared types for The Star's Heart story server and client.

mod api;
pub mod chapter;
pub mod policy;
mod progress;

pub use api::*;
pub use progress::*;
