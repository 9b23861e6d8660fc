//! CLI tooling for the discovery operations.

pub mod cli;
pub mod format;
