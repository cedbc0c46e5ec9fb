//! Pomodoro Core - Shared plumbing for the pomodoro timer
//!
//! Standard paths, runtime configuration and human-readable formatting.

pub mod config;
pub mod format;
pub mod paths;

pub use config::{Config, Locale};
pub use paths::Paths;
