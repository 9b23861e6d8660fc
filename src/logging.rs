//! Structured logging via `tracing`.
//!
//! Level, format, and destination come from config with `SOURCECOOP_LOG*`
//! environment variables taking precedence. Default destination is a log
//! file under the platform state directory so CLI output stays clean.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::error::ApiError;

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Whether logging is enabled (default: true).
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level: trace, debug, info, warn, error, off.
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format: json or text.
    #[serde(default = "default_format")]
    pub format: String,

    /// Destination: stdout, stderr, file, or file+stderr.
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file path when output includes file; None means the platform
    /// state directory default.
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Colored output (text format, terminal destinations only).
    #[serde(default = "default_true")]
    pub color: bool,
}

fn default_true() -> bool {
    true
}

fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "file".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            level: default_level(),
            format: default_format(),
            output: default_output(),
            file: None,
            color: default_true(),
        }
    }
}

/// Resolve the log file path: `SOURCECOOP_LOG_FILE`, then config, then the
/// platform state directory.
pub fn resolve_log_file_path(config_file: Option<PathBuf>) -> Result<PathBuf, ApiError> {
    if let Ok(env_path) = std::env::var("SOURCECOOP_LOG_FILE") {
        if !env_path.is_empty() {
            return Ok(PathBuf::from(env_path));
        }
    }
    if let Some(path) = config_file {
        if !path.as_os_str().is_empty() {
            return Ok(path);
        }
    }

    let dirs = directories::ProjectDirs::from("", "sourcecoop", "sourcecoop").ok_or_else(|| {
        ApiError::ConfigError("could not determine platform state directory for log file".to_string())
    })?;
    let state_dir = dirs
        .state_dir()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| dirs.cache_dir().to_path_buf());
    Ok(state_dir.join("sourcecoop.log"))
}

fn open_log_file(path: &PathBuf) -> Result<std::fs::File, ApiError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ApiError::ConfigError(format!("failed to create log directory: {}", e)))?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| ApiError::ConfigError(format!("failed to open log file {:?}: {}", path, e)))
}

fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_env("SOURCECOOP_LOG") {
        return filter;
    }
    EnvFilter::new(config.level.as_str())
}

fn determine_format(config: &LoggingConfig) -> Result<String, ApiError> {
    let format = std::env::var("SOURCECOOP_LOG_FORMAT").unwrap_or_else(|_| config.format.clone());
    if format != "json" && format != "text" {
        return Err(ApiError::ConfigError(format!(
            "invalid log format: {} (must be 'json' or 'text')",
            format
        )));
    }
    Ok(format)
}

fn determine_output(config: &LoggingConfig) -> String {
    std::env::var("SOURCECOOP_LOG_OUTPUT").unwrap_or_else(|_| config.output.clone())
}

fn build_writer(output: &str, config: &LoggingConfig) -> Result<(BoxMakeWriter, bool), ApiError> {
    // Bool is whether ANSI color is usable on this destination.
    match output {
        "stdout" => Ok((BoxMakeWriter::new(std::io::stdout), true)),
        "stderr" => Ok((BoxMakeWriter::new(std::io::stderr), true)),
        "file" => {
            let path = resolve_log_file_path(config.file.clone())?;
            Ok((BoxMakeWriter::new(open_log_file(&path)?), false))
        }
        "file+stderr" => {
            let path = resolve_log_file_path(config.file.clone())?;
            let writer = open_log_file(&path)?.and(std::io::stderr);
            Ok((BoxMakeWriter::new(writer), false))
        }
        other => Err(ApiError::ConfigError(format!(
            "invalid log output: {} (must be 'stdout', 'stderr', 'file', or 'file+stderr')",
            other
        ))),
    }
}

/// Initialize the logging system from config, with `SOURCECOOP_LOG*`
/// environment variables taking precedence.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ApiError> {
    if !config.enabled {
        Registry::default()
            .with(EnvFilter::new("off"))
            .with(fmt::layer().with_writer(std::io::sink))
            .init();
        return Ok(());
    }

    let filter = build_env_filter(config);
    let format = determine_format(config)?;
    let output = determine_output(config);
    let (writer, ansi_capable) = build_writer(&output, config)?;

    let base = Registry::default().with(filter);
    if format == "json" {
        base.with(
            fmt::layer()
                .json()
                .with_target(true)
                .with_timer(ChronoUtc::rfc_3339())
                .with_writer(writer),
        )
        .init();
    } else {
        base.with(
            fmt::layer()
                .with_target(true)
                .with_timer(ChronoUtc::rfc_3339())
                .with_ansi(config.color && ansi_capable)
                .with_writer(writer),
        )
        .init();
    }

    Ok(())
}
