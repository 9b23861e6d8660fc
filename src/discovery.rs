//! Discovery operations over the object store and metadata API.
//!
//! This is the operation surface the CLI exposes: account and product
//! enumeration, product details with README retrieval, file listing in tree
//! or flat form, per-object metadata, and fuzzy product search.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::catalog::{CatalogClient, Product};
use crate::error::ApiError;
use crate::search::{search_products, SearchField, SearchHit};
use crate::store::ObjectStore;
use crate::tree::{build_tree, DirectoryEntry, TreeRenderer, TreeStats};
use crate::types::ListingEntry;

const README_VARIANTS: [&str; 4] = ["readme.md", "readme.markdown", "readme.txt", "readme"];

/// A product discovered by scanning the bucket directly (published or not).
#[derive(Debug, Clone, Serialize)]
pub struct S3Product {
    pub product_id: String,
    pub account_id: String,
    pub source: &'static str,
    pub s3_prefix: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_count: Option<usize>,
}

/// One file with fully-qualified locators, ready for downstream analysis.
#[derive(Debug, Clone, Serialize)]
pub struct FileInfo {
    pub key: String,
    pub s3_uri: String,
    pub http_url: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub etag: Option<String>,
}

/// Stats for a flat (one-level) listing.
#[derive(Debug, Clone, Serialize)]
pub struct FlatStats {
    pub total_files: usize,
    pub total_directories: usize,
}

/// Output of `list_product_files`: either the summarized tree or a flat
/// one-level listing, never both.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum FileListing {
    Tree { tree: String, stats: TreeStats },
    Flat {
        files: Vec<FileInfo>,
        directories: Vec<DirectoryEntry>,
        stats: FlatStats,
    },
}

/// Discovery operations over one bucket and its metadata API.
pub struct DiscoveryService {
    store: Arc<dyn ObjectStore>,
    catalog: CatalogClient,
    /// Per-account product lists, so search after a listing (or repeated
    /// searches in a long-lived process) does not refetch the whole catalog.
    product_cache: Mutex<HashMap<String, Vec<Product>>>,
}

impl DiscoveryService {
    pub fn new(store: Arc<dyn ObjectStore>, catalog: CatalogClient) -> Self {
        Self {
            store,
            catalog,
            product_cache: Mutex::new(HashMap::new()),
        }
    }

    fn s3_uri(&self, key: &str) -> String {
        format!("s3://{}/{}", self.store.bucket(), key)
    }

    fn file_info(&self, meta: &crate::store::ObjectMeta) -> FileInfo {
        FileInfo {
            key: meta.key.clone(),
            s3_uri: self.s3_uri(&meta.key),
            http_url: self.catalog.proxy_url(&meta.key),
            size: meta.size,
            last_modified: meta.last_modified,
            etag: meta.etag.clone(),
        }
    }

    /// All account ids in the bucket, sorted.
    pub async fn list_accounts(&self) -> Result<Vec<String>, ApiError> {
        info!("listing accounts from bucket root");
        let page = self.store.list_with_delimiter("").await?;
        let mut accounts: Vec<String> = page
            .common_prefixes
            .iter()
            .map(|prefix| prefix.trim_end_matches('/').to_string())
            .collect();
        accounts.sort();
        info!(count = accounts.len(), "found accounts");
        Ok(accounts)
    }

    /// Cached per-account product fetch. The lock is never held across the
    /// network call.
    async fn account_products(&self, account_id: &str) -> Result<Vec<Product>, ApiError> {
        if let Some(cached) = self.product_cache.lock().get(account_id) {
            return Ok(cached.clone());
        }
        let products = self.catalog.products(account_id).await?;
        self.product_cache
            .lock()
            .insert(account_id.to_string(), products.clone());
        Ok(products)
    }

    /// Published products from the metadata API. With no account, fans out
    /// across every account concurrently, skipping ones that fail.
    pub async fn list_products(
        &self,
        account_id: Option<&str>,
        featured_only: bool,
    ) -> Result<Vec<Product>, ApiError> {
        let mut products = match account_id {
            Some(account) => self.account_products(account).await?,
            None => {
                let accounts = self.list_accounts().await?;
                let results = future::join_all(
                    accounts.iter().map(|account| self.account_products(account)),
                )
                .await;

                let mut all = Vec::new();
                for (account, result) in accounts.iter().zip(results) {
                    match result {
                        Ok(mut products) => all.append(&mut products),
                        Err(e) => {
                            warn!(account = %account, error = %e, "skipping account");
                        }
                    }
                }
                all
            }
        };

        if featured_only {
            products.retain(Product::is_featured);
        }
        Ok(products)
    }

    /// All products for an account discovered by scanning the bucket,
    /// including unpublished ones the metadata API does not return.
    pub async fn list_products_from_s3(
        &self,
        account_id: &str,
        include_file_count: bool,
    ) -> Result<Vec<S3Product>, ApiError> {
        let page = self
            .store
            .list_with_delimiter(&format!("{}/", account_id))
            .await?;

        let mut products = Vec::new();
        for prefix in &page.common_prefixes {
            let product_id = prefix
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string();

            let file_count = if include_file_count {
                match self.store.list_with_delimiter(prefix).await {
                    Ok(inner) => Some(inner.objects.len()),
                    Err(e) => {
                        warn!(product_id = %product_id, error = %e, "could not count files");
                        None
                    }
                }
            } else {
                None
            };

            products.push(S3Product {
                product_id,
                account_id: account_id.to_string(),
                source: "s3",
                s3_prefix: self.s3_uri(prefix),
                file_count,
            });
        }

        products.sort_by(|a, b| a.product_id.cmp(&b.product_id));
        Ok(products)
    }

    /// Full product metadata, always enriched with README content when a
    /// README variant exists in the product root.
    pub async fn get_product_details(
        &self,
        account_id: &str,
        product_id: &str,
    ) -> Result<Value, ApiError> {
        let mut details = self.catalog.product(account_id, product_id).await?;

        let readme = match self.fetch_readme(account_id, product_id).await {
            Ok(readme) => readme,
            Err(e) => {
                warn!(account_id, product_id, error = %e, "error fetching README");
                json!({ "found": false, "error": e.to_string() })
            }
        };
        if let Some(object) = details.as_object_mut() {
            object.insert("readme".to_string(), readme);
        }
        Ok(details)
    }

    async fn fetch_readme(&self, account_id: &str, product_id: &str) -> Result<Value, ApiError> {
        let prefix = format!("{}/{}/", account_id, product_id);
        let page = self.store.list_with_delimiter(&prefix).await?;

        let readme_meta = page.objects.iter().find(|obj| {
            let filename = obj.key.rsplit('/').next().unwrap_or_default();
            README_VARIANTS.contains(&filename.to_lowercase().as_str())
        });

        let meta = match readme_meta {
            Some(meta) => meta,
            None => return Ok(json!({ "found": false, "content": null })),
        };

        let url = self.catalog.proxy_url(&meta.key);
        match self.catalog.fetch_text(&meta.key).await {
            Ok(content) => Ok(json!({
                "found": true,
                "content": content,
                "size": meta.size,
                "path": meta.key,
                "filename": meta.key.rsplit('/').next().unwrap_or_default(),
                "last_modified": meta.last_modified,
                "url": url,
            })),
            Err(ApiError::ApiStatus { status, .. }) => Ok(json!({
                "found": true,
                "content": null,
                "error": format!("HTTP {}", status),
                "path": meta.key,
            })),
            Err(e) => Err(e),
        }
    }

    /// List a product's files, either as the summarized tree view or as a
    /// flat one-level listing.
    pub async fn list_product_files(
        &self,
        account_id: &str,
        product_id: &str,
        prefix: &str,
        max_files: usize,
        tree_view: bool,
    ) -> Result<FileListing, ApiError> {
        let mut path_prefix = format!("{}/{}/", account_id, product_id);
        if !prefix.is_empty() {
            path_prefix.push_str(prefix.trim_start_matches('/'));
        }
        info!(prefix = %path_prefix, max_files, tree_view, "listing product files");

        if !tree_view {
            let page = self.store.list_with_delimiter(&path_prefix).await?;
            let files: Vec<FileInfo> = page
                .objects
                .iter()
                .take(max_files)
                .map(|meta| self.file_info(meta))
                .collect();
            let directories: Vec<DirectoryEntry> = page
                .common_prefixes
                .iter()
                .map(|p| DirectoryEntry {
                    name: p.trim_end_matches('/').rsplit('/').next().unwrap_or_default().to_string(),
                    path: p.clone(),
                    reference: self.s3_uri(p),
                })
                .collect();
            let stats = FlatStats {
                total_files: files.len(),
                total_directories: directories.len(),
            };
            return Ok(FileListing::Flat {
                files,
                directories,
                stats,
            });
        }

        let objects = self.store.list(&path_prefix, max_files).await?;
        let truncated = objects.len() >= max_files;
        let entries: Vec<ListingEntry> = objects
            .iter()
            .map(|meta| ListingEntry::new(meta.key.clone(), meta.size))
            .collect();

        let tree = build_tree(&entries, &path_prefix, |key| self.s3_uri(key));
        let root_reference = self.s3_uri(&path_prefix);
        let rendered = TreeRenderer::new(&root_reference, &path_prefix).render(&tree, truncated);

        Ok(FileListing::Tree {
            tree: rendered.text(),
            stats: rendered.stats,
        })
    }

    /// Metadata for a single object. Accepts `s3://bucket/key` or a
    /// bucket-relative key.
    pub async fn get_file_metadata(&self, path: &str) -> Result<FileInfo, ApiError> {
        let key = match path.strip_prefix("s3://") {
            Some(rest) => {
                let (bucket, key) = rest
                    .split_once('/')
                    .ok_or_else(|| ApiError::InvalidPath(path.to_string()))?;
                if bucket != self.store.bucket() {
                    return Err(ApiError::InvalidPath(format!(
                        "{} is not in bucket {}",
                        path,
                        self.store.bucket()
                    )));
                }
                key
            }
            None => path,
        };

        let meta = self.store.head(key).await?;
        Ok(self.file_info(&meta))
    }

    /// Fuzzy product search across the metadata API.
    pub async fn search(
        &self,
        query: &str,
        account_id: Option<&str>,
        fields: &[SearchField],
    ) -> Result<Vec<SearchHit>, ApiError> {
        let products = self.list_products(account_id, false).await?;
        let hits = search_products(products, query, fields);
        info!(query, count = hits.len(), "search complete");
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ListingPage, ObjectMeta};
    use async_trait::async_trait;
    use std::collections::BTreeMap;

    /// In-memory store: keys to sizes, no network.
    struct FakeStore {
        bucket: String,
        objects: BTreeMap<String, u64>,
    }

    impl FakeStore {
        fn new(keys: &[(&str, u64)]) -> Self {
            Self {
                bucket: "test-bucket".to_string(),
                objects: keys
                    .iter()
                    .map(|(k, s)| (k.to_string(), *s))
                    .collect(),
            }
        }

        fn meta(&self, key: &str, size: u64) -> ObjectMeta {
            ObjectMeta {
                key: key.to_string(),
                size,
                last_modified: None,
                etag: None,
            }
        }
    }

    #[async_trait]
    impl ObjectStore for FakeStore {
        async fn list(&self, prefix: &str, max_entries: usize) -> Result<Vec<ObjectMeta>, ApiError> {
            Ok(self
                .objects
                .iter()
                .filter(|(k, _)| k.starts_with(prefix) && !k.ends_with('/'))
                .take(max_entries)
                .map(|(k, s)| self.meta(k, *s))
                .collect())
        }

        async fn list_with_delimiter(&self, prefix: &str) -> Result<ListingPage, ApiError> {
            let mut page = ListingPage::default();
            let mut seen_prefixes = BTreeMap::new();
            for (key, size) in &self.objects {
                let Some(rest) = key.strip_prefix(prefix) else {
                    continue;
                };
                match rest.split_once('/') {
                    Some((first, _)) => {
                        seen_prefixes.insert(format!("{}{}/", prefix, first), ());
                    }
                    None => {
                        if !key.ends_with('/') {
                            page.objects.push(self.meta(key, *size));
                        }
                    }
                }
            }
            page.common_prefixes = seen_prefixes.into_keys().collect();
            Ok(page)
        }

        async fn head(&self, key: &str) -> Result<ObjectMeta, ApiError> {
            self.objects
                .get(key)
                .map(|size| self.meta(key, *size))
                .ok_or_else(|| ApiError::NotFound(key.to_string()))
        }

        fn bucket(&self) -> &str {
            &self.bucket
        }
    }

    fn service(keys: &[(&str, u64)]) -> DiscoveryService {
        let catalog =
            CatalogClient::new("https://api.invalid/v1", "https://data.invalid", 5).unwrap();
        DiscoveryService::new(Arc::new(FakeStore::new(keys)), catalog)
    }

    #[tokio::test]
    async fn test_list_accounts_from_root_prefixes() {
        let svc = service(&[
            ("harvard-lil/gov-data/README.md", 10),
            ("clarkcga/hls/data.tif", 20),
        ]);
        let accounts = svc.list_accounts().await.unwrap();
        assert_eq!(accounts, vec!["clarkcga", "harvard-lil"]);
    }

    #[tokio::test]
    async fn test_list_products_from_s3_sorted_with_counts() {
        let svc = service(&[
            ("acct/zeta/a.csv", 1),
            ("acct/alpha/b.csv", 1),
            ("acct/alpha/c.csv", 1),
        ]);
        let products = svc.list_products_from_s3("acct", true).await.unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].product_id, "alpha");
        assert_eq!(products[0].s3_prefix, "s3://test-bucket/acct/alpha/");
        assert_eq!(products[0].file_count, Some(2));
        assert_eq!(products[1].product_id, "zeta");
    }

    #[tokio::test]
    async fn test_tree_listing_builds_summarized_view() {
        let svc = service(&[
            ("acct/prod/README.md", 100),
            ("acct/prod/data/0.parquet", 10),
            ("acct/prod/data/1.parquet", 10),
            ("acct/prod/data/2.parquet", 10),
        ]);
        let listing = svc
            .list_product_files("acct", "prod", "", 1000, true)
            .await
            .unwrap();
        match listing {
            FileListing::Tree { tree, stats } => {
                assert!(tree.starts_with("s3://test-bucket/acct/prod/"));
                assert!(tree.contains("[0-2].parquet (3 files"));
                assert_eq!(stats.total_files, 4);
                assert_eq!(stats.total_size, 130);
                assert!(!stats.truncated);
            }
            other => panic!("expected tree listing, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_flat_listing_returns_files_and_directories() {
        let svc = service(&[
            ("acct/prod/README.md", 100),
            ("acct/prod/data/0.parquet", 10),
        ]);
        let listing = svc
            .list_product_files("acct", "prod", "", 1000, false)
            .await
            .unwrap();
        match listing {
            FileListing::Flat {
                files,
                directories,
                stats,
            } => {
                assert_eq!(files.len(), 1);
                assert_eq!(files[0].key, "acct/prod/README.md");
                assert_eq!(files[0].http_url, "https://data.invalid/acct/prod/README.md");
                assert_eq!(directories.len(), 1);
                assert_eq!(directories[0].name, "data");
                assert_eq!(stats.total_files, 1);
                assert_eq!(stats.total_directories, 1);
            }
            other => panic!("expected flat listing, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_truncation_flag_set_at_cap() {
        let keys: Vec<(String, u64)> = (0..20)
            .map(|i| (format!("acct/prod/f{:02}.bin", i), 1))
            .collect();
        let borrowed: Vec<(&str, u64)> = keys.iter().map(|(k, s)| (k.as_str(), *s)).collect();
        let svc = service(&borrowed);
        let listing = svc
            .list_product_files("acct", "prod", "", 10, true)
            .await
            .unwrap();
        match listing {
            FileListing::Tree { stats, .. } => {
                assert_eq!(stats.total_files, 10);
                assert!(stats.truncated);
            }
            other => panic!("expected tree listing, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_file_metadata_accepts_s3_uri_and_relative() {
        let svc = service(&[("acct/prod/file.bin", 42)]);
        let by_key = svc.get_file_metadata("acct/prod/file.bin").await.unwrap();
        assert_eq!(by_key.size, 42);
        assert_eq!(by_key.s3_uri, "s3://test-bucket/acct/prod/file.bin");

        let by_uri = svc
            .get_file_metadata("s3://test-bucket/acct/prod/file.bin")
            .await
            .unwrap();
        assert_eq!(by_uri.key, "acct/prod/file.bin");

        let wrong_bucket = svc.get_file_metadata("s3://other/acct/prod/file.bin").await;
        assert!(matches!(wrong_bucket, Err(ApiError::InvalidPath(_))));
    }
}
