//! Core types shared across the discovery crate.

/// Default cap on listing entries consumed per invocation.
pub const DEFAULT_MAX_FILES: usize = 1000;

/// One object from a listing snapshot: a slash-separated bucket-relative
/// path (no leading slash) and its size in bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub path: String,
    pub size: u64,
}

impl ListingEntry {
    pub fn new(path: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }
}
