//! CLI command implementations

pub mod config;
pub mod sync;
pub mod watch;
