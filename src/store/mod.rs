//! Object-store access for the open-data bucket.
//!
//! The discovery operations only need three primitives: a capped recursive
//! listing, a one-level delimiter listing, and a head fetch. They are
//! expressed as a trait so the tree engine and tests never touch the network.

pub mod s3;

pub use s3::S3ObjectStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ApiError;

/// Metadata for one stored object.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ObjectMeta {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub etag: Option<String>,
}

/// One page of a delimiter listing: the objects directly under a prefix plus
/// the common prefixes (immediate subdirectories).
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    pub objects: Vec<ObjectMeta>,
    pub common_prefixes: Vec<String>,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Recursively list objects under `prefix`, stopping after `max_entries`.
    /// Directory markers are filtered out.
    async fn list(&self, prefix: &str, max_entries: usize) -> Result<Vec<ObjectMeta>, ApiError>;

    /// List the immediate children of `prefix` (one level only).
    async fn list_with_delimiter(&self, prefix: &str) -> Result<ListingPage, ApiError>;

    /// Fetch metadata for a single object without downloading it.
    async fn head(&self, key: &str) -> Result<ObjectMeta, ApiError>;

    /// The bucket this store reads from.
    fn bucket(&self) -> &str;
}
