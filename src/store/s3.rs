//! Anonymous S3 access to public open-data buckets.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use tracing::debug;

use super::{ListingPage, ObjectMeta, ObjectStore};
use crate::error::ApiError;

const PAGE_SIZE: i32 = 1000;

/// Unsigned S3 client scoped to one public bucket.
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Connect to a public bucket without credentials (unsigned requests).
    pub async fn connect(bucket: &str, region: &str) -> Self {
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .no_credentials()
            .load()
            .await;
        Self {
            client: Client::new(&shared),
            bucket: bucket.to_string(),
        }
    }
}

fn convert_timestamp(t: aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(t.secs(), t.subsec_nanos())
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list(&self, prefix: &str, max_entries: usize) -> Result<Vec<ObjectMeta>, ApiError> {
        let mut collected = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut req = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .max_keys(PAGE_SIZE);
            if let Some(ref token) = continuation_token {
                req = req.continuation_token(token);
            }

            let resp = req
                .send()
                .await
                .map_err(|e| ApiError::ObjectStore(format!("list failed for {}: {}", prefix, e)))?;

            if let Some(contents) = resp.contents {
                for obj in contents {
                    let key = obj.key.unwrap_or_default();
                    // Skip directory markers and empty keys.
                    if key.is_empty() || key.ends_with('/') {
                        continue;
                    }
                    collected.push(ObjectMeta {
                        key,
                        size: obj.size.unwrap_or(0).max(0) as u64,
                        last_modified: obj.last_modified.and_then(convert_timestamp),
                        etag: obj.e_tag,
                    });
                    if collected.len() >= max_entries {
                        debug!(prefix, max_entries, "listing truncated at cap");
                        return Ok(collected);
                    }
                }
            }

            if resp.is_truncated == Some(true) {
                continuation_token = resp.next_continuation_token;
                if continuation_token.is_none() {
                    break;
                }
            } else {
                break;
            }
        }

        Ok(collected)
    }

    async fn list_with_delimiter(&self, prefix: &str) -> Result<ListingPage, ApiError> {
        let mut page = ListingPage::default();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut req = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .delimiter("/")
                .max_keys(PAGE_SIZE);
            if let Some(ref token) = continuation_token {
                req = req.continuation_token(token);
            }

            let resp = req.send().await.map_err(|e| {
                ApiError::ObjectStore(format!("delimiter listing failed for {}: {}", prefix, e))
            })?;

            if let Some(prefixes) = resp.common_prefixes {
                for cp in prefixes {
                    if let Some(p) = cp.prefix {
                        page.common_prefixes.push(p);
                    }
                }
            }
            if let Some(contents) = resp.contents {
                for obj in contents {
                    let key = obj.key.unwrap_or_default();
                    if key.is_empty() || key.ends_with('/') {
                        continue;
                    }
                    page.objects.push(ObjectMeta {
                        key,
                        size: obj.size.unwrap_or(0).max(0) as u64,
                        last_modified: obj.last_modified.and_then(convert_timestamp),
                        etag: obj.e_tag,
                    });
                }
            }

            if resp.is_truncated == Some(true) {
                continuation_token = resp.next_continuation_token;
                if continuation_token.is_none() {
                    break;
                }
            } else {
                break;
            }
        }

        Ok(page)
    }

    async fn head(&self, key: &str) -> Result<ObjectMeta, ApiError> {
        let resp = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let service_err = e.into_service_error();
                if service_err.is_not_found() {
                    ApiError::NotFound(key.to_string())
                } else {
                    ApiError::ObjectStore(format!("head failed for {}: {}", key, service_err))
                }
            })?;

        Ok(ObjectMeta {
            key: key.to_string(),
            size: resp.content_length.unwrap_or(0).max(0) as u64,
            last_modified: resp.last_modified.and_then(convert_timestamp),
            etag: resp.e_tag,
        })
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}
