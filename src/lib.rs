//! patchwise: commit file review orchestrator (library crate).
//!
//! Re-exports public modules for integration tests and external use.

pub mod config;
pub mod constants;
pub mod diff;
pub mod env;
pub mod excerpt;
pub mod models;
pub mod orchestrator;
pub mod progress;
pub mod prompt;
pub mod providers;
pub mod report;
pub mod retry;
