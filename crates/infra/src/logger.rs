//! Logging setup for Movie Catalog
//!
//! Installs a `tracing` subscriber with an env filter and a text or JSON
//! formatter. HTTP client internals are capped at `warn`.

use movie_catalog_core::config::LoggingConfig;
use movie_catalog_core::{CatalogError, Result};
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Logger configuration
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to use JSON format
    pub json_format: bool,
    /// Whether to include timestamps
    pub with_timestamps: bool,
    /// Whether to include file/line information
    pub with_file_info: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            with_timestamps: true,
            with_file_info: false,
        }
    }
}

impl From<&LoggingConfig> for LoggerConfig {
    fn from(config: &LoggingConfig) -> Self {
        Self {
            level: config.level.clone(),
            json_format: config.format.eq_ignore_ascii_case("json"),
            ..Default::default()
        }
    }
}

/// Initialize the global logger with the given configuration
pub fn init_logger(config: LoggerConfig) -> Result<()> {
    let level = LogLevel::parse(&config.level)?;

    let mut env_filter = EnvFilter::from_default_env().add_directive(level.into());
    for quiet in ["hyper=warn", "reqwest=warn", "h2=warn"] {
        let directive = quiet
            .parse()
            .map_err(|e| CatalogError::validation(format!("Bad log directive {}: {}", quiet, e)))?;
        env_filter = env_filter.add_directive(directive);
    }

    let fmt_layer = if config.json_format {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_file(config.with_file_info)
            .with_line_number(config.with_file_info)
            .boxed()
    } else {
        let layer = fmt::layer()
            .with_target(true)
            .with_file(config.with_file_info)
            .with_line_number(config.with_file_info);

        if config.with_timestamps {
            layer.boxed()
        } else {
            layer.without_time().boxed()
        }
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| CatalogError::validation(format!("Failed to initialize logger: {}", e)))?;

    tracing::debug!("Logger initialized with level: {}", config.level);
    Ok(())
}

/// Initialize logger for tests; repeated calls are harmless
pub fn init_test_logger() {
    let config = LoggerConfig {
        level: "warn".to_string(),
        with_timestamps: false,
        ..Default::default()
    };
    let _ = init_logger(config);
}

/// Logger configuration from `CATALOG_LOG_LEVEL`, `CATALOG_LOG_JSON` and
/// `CATALOG_LOG_FILE_INFO`
pub fn logger_config_from_env() -> LoggerConfig {
    let flag = |name: &str, default: bool| {
        std::env::var(name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    };

    LoggerConfig {
        level: std::env::var("CATALOG_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        json_format: flag("CATALOG_LOG_JSON", false),
        with_timestamps: flag("CATALOG_LOG_TIMESTAMPS", true),
        with_file_info: flag("CATALOG_LOG_FILE_INFO", false),
    }
}

/// Log level utilities
pub struct LogLevel;

impl LogLevel {
    /// Parse log level from string
    pub fn parse(level: &str) -> Result<Level> {
        Level::from_str(level)
            .map_err(|e| CatalogError::validation(format!("Invalid log level '{}': {}", level, e)))
    }

    pub fn all_levels() -> Vec<&'static str> {
        vec!["trace", "debug", "info", "warn", "error"]
    }

    pub fn is_valid(level: &str) -> bool {
        Self::all_levels().contains(&level.to_lowercase().as_str())
    }
}
