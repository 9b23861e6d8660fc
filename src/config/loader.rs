//! Layered configuration loading.
//!
//! Precedence: defaults (lowest) -> XDG config file -> explicit file ->
//! `SOURCECOOP_*` environment (highest).

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};

use super::SourcecoopConfig;
use crate::error::ApiError;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Default config file location (~/.config/sourcecoop/config.toml).
    fn xdg_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "sourcecoop", "sourcecoop")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load configuration, optionally from an explicit file.
    pub fn load(explicit_file: Option<&Path>) -> Result<SourcecoopConfig, ApiError> {
        let mut builder = Config::builder();

        match explicit_file {
            Some(path) => {
                let path = path.to_str().ok_or_else(|| {
                    ApiError::ConfigError(format!("non-UTF-8 config path: {:?}", path))
                })?;
                builder = builder.add_source(File::with_name(path));
            }
            None => {
                if let Some(path) = Self::xdg_config_path() {
                    builder = builder
                        .add_source(File::from(path).required(false));
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("SOURCECOOP")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .and_then(Config::try_deserialize)
            .map_err(|e| ApiError::ConfigError(e.to_string()))
    }
}
