//! Command-line interface for the discovery operations.
//!
//! One subcommand per operation; each produces text or JSON output. The
//! context owns the async runtime, the object-store client, and the metadata
//! API client, and executes commands to a printable string.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::catalog::CatalogClient;
use crate::config::{ConfigLoader, SourcecoopConfig};
use crate::discovery::{DiscoveryService, FileListing};
use crate::error::ApiError;
use crate::logging::init_logging;
use crate::search::SearchField;
use crate::store::S3ObjectStore;
use crate::tooling::format;
use crate::types::DEFAULT_MAX_FILES;

/// Sourcecoop CLI - data discovery for Source Cooperative open data
#[derive(Parser)]
#[command(name = "sourcecoop")]
#[command(about = "Discover accounts, products, and files in Source Cooperative open data")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Open-data bucket (overrides config)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Bucket region (overrides config)
    #[arg(long)]
    pub region: Option<String>,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List all accounts in the open-data bucket
    Accounts {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List products for an account, or across all accounts
    Products {
        /// Account id; omit to discover across all accounts
        #[arg(long)]
        account: Option<String>,
        /// Only featured products
        #[arg(long)]
        featured: bool,
        /// Scan the bucket directly instead of the metadata API
        /// (finds unpublished products; requires --account)
        #[arg(long)]
        from_s3: bool,
        /// Count files per product (bucket scan only, slower)
        #[arg(long)]
        file_counts: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show full product metadata including README content
    Details {
        account: String,
        product: String,
    },
    /// List product files as a summarized tree or a flat listing
    Files {
        account: String,
        product: String,
        /// Subdirectory prefix within the product
        #[arg(long, default_value = "")]
        prefix: String,
        /// Maximum files to list
        #[arg(long, default_value_t = DEFAULT_MAX_FILES)]
        max_files: usize,
        /// Flat one-level listing instead of the tree view
        #[arg(long)]
        flat: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show metadata for a single object (s3:// URI or relative key)
    Metadata {
        path: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Fuzzy-search products by title, description, or product id
    Search {
        query: String,
        /// Restrict to one account (much faster)
        #[arg(long)]
        account: Option<String>,
        /// Fields to search (comma-separated: title, description, product_id)
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

/// Owns the runtime and clients; executes commands to printable output.
pub struct CliContext {
    runtime: tokio::runtime::Runtime,
    service: DiscoveryService,
}

impl CliContext {
    pub fn new(cli: &Cli) -> Result<Self, ApiError> {
        let mut config = ConfigLoader::load(cli.config.as_deref())?;
        apply_cli_overrides(&mut config, cli);
        init_logging(&config.logging)?;

        let runtime = tokio::runtime::Runtime::new()
            .map_err(|e| ApiError::ConfigError(format!("failed to start runtime: {}", e)))?;
        let store = runtime.block_on(S3ObjectStore::connect(&config.bucket, &config.region));
        let catalog = CatalogClient::new(
            &config.api_base,
            &config.data_proxy,
            config.http_timeout_secs,
        )?;
        let service = DiscoveryService::new(Arc::new(store), catalog);

        Ok(Self { runtime, service })
    }

    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Accounts { format } => {
                let accounts = self.runtime.block_on(self.service.list_accounts())?;
                if format == "json" {
                    Ok(serde_json::to_string_pretty(&accounts)?)
                } else {
                    Ok(format::format_accounts_text(&accounts))
                }
            }
            Commands::Products {
                account,
                featured,
                from_s3,
                file_counts,
                format,
            } => {
                if *from_s3 {
                    let account = account.as_deref().ok_or_else(|| {
                        ApiError::ConfigError("--from-s3 requires --account".to_string())
                    })?;
                    let products = self
                        .runtime
                        .block_on(self.service.list_products_from_s3(account, *file_counts))?;
                    if format == "json" {
                        Ok(serde_json::to_string_pretty(&products)?)
                    } else {
                        Ok(format::format_s3_products_text(&products))
                    }
                } else {
                    let products = self
                        .runtime
                        .block_on(self.service.list_products(account.as_deref(), *featured))?;
                    if format == "json" {
                        Ok(serde_json::to_string_pretty(&products)?)
                    } else {
                        Ok(format::format_products_text(&products))
                    }
                }
            }
            Commands::Details { account, product } => {
                let details = self
                    .runtime
                    .block_on(self.service.get_product_details(account, product))?;
                Ok(serde_json::to_string_pretty(&details)?)
            }
            Commands::Files {
                account,
                product,
                prefix,
                max_files,
                flat,
                format,
            } => {
                let listing = self.runtime.block_on(self.service.list_product_files(
                    account,
                    product,
                    prefix,
                    *max_files,
                    !*flat,
                ))?;
                if format == "json" {
                    return Ok(serde_json::to_string_pretty(&listing)?);
                }
                match &listing {
                    FileListing::Tree { tree, stats } => {
                        Ok(format!("{}\n{}", tree, format::format_tree_stats_text(stats)))
                    }
                    FileListing::Flat {
                        files,
                        directories,
                        stats,
                    } => Ok(format::format_flat_listing_text(files, directories, stats)),
                }
            }
            Commands::Metadata { path, format } => {
                let info = self.runtime.block_on(self.service.get_file_metadata(path))?;
                if format == "json" {
                    Ok(serde_json::to_string_pretty(&info)?)
                } else {
                    Ok(format::format_file_info_text(&info))
                }
            }
            Commands::Search {
                query,
                account,
                fields,
                format,
            } => {
                let fields = parse_search_fields(fields)?;
                let hits = self.runtime.block_on(self.service.search(
                    query,
                    account.as_deref(),
                    &fields,
                ))?;
                if format == "json" {
                    Ok(serde_json::to_string_pretty(&hits)?)
                } else {
                    Ok(format::format_search_text(&hits))
                }
            }
        }
    }
}

fn apply_cli_overrides(config: &mut SourcecoopConfig, cli: &Cli) {
    if let Some(bucket) = &cli.bucket {
        config.bucket = bucket.clone();
    }
    if let Some(region) = &cli.region {
        config.region = region.clone();
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.logging.format = format.clone();
    }
    if let Some(output) = &cli.log_output {
        config.logging.output = output.clone();
    }
    if let Some(file) = &cli.log_file {
        config.logging.file = Some(file.clone());
    }
}

fn parse_search_fields(raw: &[String]) -> Result<Vec<SearchField>, ApiError> {
    if raw.is_empty() {
        return Ok(SearchField::ALL.to_vec());
    }
    raw.iter().map(|s| s.parse()).collect()
}
