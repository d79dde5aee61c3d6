//! Shared helpers for the `directory-search` binary.

pub mod logging;
pub mod report;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
