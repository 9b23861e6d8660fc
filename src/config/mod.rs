//! Crate configuration: bucket, endpoints, and logging.

pub mod loader;

pub use loader::ConfigLoader;

use serde::{Deserialize, Serialize};

use crate::logging::LoggingConfig;

pub const DEFAULT_BUCKET: &str = "us-west-2.opendata.source.coop";
pub const DEFAULT_REGION: &str = "us-west-2";
pub const DEFAULT_API_BASE: &str = "https://source.coop/api/v1";
pub const DEFAULT_DATA_PROXY: &str = "https://data.source.coop";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Top-level configuration. Every field has a default; a missing config file
/// yields a fully working setup against the public bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcecoopConfig {
    /// Open-data bucket to discover against.
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Region of the bucket.
    #[serde(default = "default_region")]
    pub region: String,

    /// Base URL of the metadata API.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Host serving object content over HTTP.
    #[serde(default = "default_data_proxy")]
    pub data_proxy: String,

    /// Timeout for metadata API and data-proxy requests.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_bucket() -> String {
    DEFAULT_BUCKET.to_string()
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_data_proxy() -> String {
    DEFAULT_DATA_PROXY.to_string()
}

fn default_http_timeout() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

impl Default for SourcecoopConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            region: default_region(),
            api_base: default_api_base(),
            data_proxy: default_data_proxy(),
            http_timeout_secs: default_http_timeout(),
            logging: LoggingConfig::default(),
        }
    }
}
