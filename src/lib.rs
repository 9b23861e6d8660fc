//! Sourcecoop: Data Discovery for Source Cooperative
//!
//! Discovery operations over the Source Cooperative open-data bucket and its
//! companion metadata API, built around a pattern-aware file-tree
//! summarization engine that compresses large object listings into compact,
//! readable hierarchies.

pub mod catalog;
pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod search;
pub mod store;
pub mod tooling;
pub mod tree;
pub mod types;
