//! Tracing subscriber setup
//!
//! The library only emits `tracing` events; applications decide where they go.
//! These helpers cover the common setups.
//!
//! ```rust,ignore
//! use siumai_flow::telemetry::subscriber::{init_subscriber, OutputFormat, SubscriberConfig};
//!
//! // Initialize with default configuration
//! init_subscriber(SubscriberConfig::default())?;
//!
//! // JSON logs at debug level
//! let config = SubscriberConfig::builder()
//!     .log_level(tracing::Level::DEBUG)
//!     .output_format(OutputFormat::Json)
//!     .build();
//! init_subscriber(config)?;
//! ```

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::error::FlowError;

/// Output format for tracing logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON, one object per line
    Json,
}

/// Configuration for tracing subscriber
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    pub log_level: tracing::Level,
    pub output_format: OutputFormat,
    /// Write to this file (non-blocking) instead of stdout
    pub log_file: Option<PathBuf>,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            log_level: tracing::Level::INFO,
            output_format: OutputFormat::Text,
            log_file: None,
        }
    }
}

impl SubscriberConfig {
    pub fn builder() -> SubscriberConfigBuilder {
        SubscriberConfigBuilder::default()
    }

    pub fn debug() -> Self {
        Self {
            log_level: tracing::Level::DEBUG,
            ..Self::default()
        }
    }

    /// Directive string scoping the level to this crate.
    fn filter_directive(&self) -> String {
        format!("siumai_flow={}", self.log_level.as_str().to_ascii_lowercase())
    }
}

/// Builder for SubscriberConfig
#[derive(Debug, Default)]
pub struct SubscriberConfigBuilder {
    log_level: Option<tracing::Level>,
    output_format: Option<OutputFormat>,
    log_file: Option<PathBuf>,
}

impl SubscriberConfigBuilder {
    pub fn log_level(mut self, level: tracing::Level) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Set the log level from a string
    pub fn log_level_str(mut self, level: &str) -> Result<Self, FlowError> {
        self.log_level = Some(parse_level(level)?);
        Ok(self)
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn log_file(mut self, path: PathBuf) -> Self {
        self.log_file = Some(path);
        self
    }

    pub fn build(self) -> SubscriberConfig {
        SubscriberConfig {
            log_level: self.log_level.unwrap_or(tracing::Level::INFO),
            output_format: self.output_format.unwrap_or_default(),
            log_file: self.log_file,
        }
    }
}

fn parse_level(level: &str) -> Result<tracing::Level, FlowError> {
    match level.trim().to_lowercase().as_str() {
        "trace" => Ok(tracing::Level::TRACE),
        "debug" => Ok(tracing::Level::DEBUG),
        "info" => Ok(tracing::Level::INFO),
        "warn" => Ok(tracing::Level::WARN),
        "error" => Ok(tracing::Level::ERROR),
        other => Err(FlowError::ConfigurationError(format!(
            "Invalid log level: {other}. Valid options: trace, debug, info, warn, error"
        ))),
    }
}

/// Install a global subscriber.
///
/// Returns the worker guard when logging to a file; keep it alive for the
/// lifetime of the program. Calling this when a subscriber is already set is
/// not an error.
pub fn init_subscriber(config: SubscriberConfig) -> Result<Option<WorkerGuard>, FlowError> {
    let filter = EnvFilter::new(config.filter_directive());

    let (writer, guard) = match &config.log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path.file_name().ok_or_else(|| {
                FlowError::ConfigurationError(format!("Invalid log file path: {}", path.display()))
            })?;
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(writer), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stdout), None),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(writer);
    let init_result = match config.output_format {
        OutputFormat::Json => builder.json().try_init(),
        OutputFormat::Text => builder.try_init(),
    };

    match init_result {
        Ok(()) => Ok(guard),
        Err(e) => {
            let error_msg = e.to_string();
            if error_msg.contains("global default trace dispatcher has already been set") {
                Ok(None)
            } else {
                Err(FlowError::ConfigurationError(format!(
                    "Failed to initialize tracing: {e}"
                )))
            }
        }
    }
}

/// Initialize tracing subscriber from environment variables
///
/// - `SIUMAI_FLOW_LOG_LEVEL`: trace, debug, info, warn, error
/// - `SIUMAI_FLOW_LOG_FORMAT`: text, json
/// - `SIUMAI_FLOW_LOG_FILE`: log file path
pub fn init_from_env() -> Result<Option<WorkerGuard>, FlowError> {
    init_subscriber(config_from_lookup(|key| std::env::var(key).ok())?)
}

fn config_from_lookup(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<SubscriberConfig, FlowError> {
    let mut builder = SubscriberConfig::builder();
    if let Some(level) = lookup("SIUMAI_FLOW_LOG_LEVEL") {
        builder = builder.log_level_str(&level)?;
    }
    if let Some(format) = lookup("SIUMAI_FLOW_LOG_FORMAT") {
        let output_format = match format.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "text" => OutputFormat::Text,
            other => {
                return Err(FlowError::ConfigurationError(format!(
                    "Invalid log format: {other}. Valid options: text, json"
                )));
            }
        };
        builder = builder.output_format(output_format);
    }
    if let Some(file) = lookup("SIUMAI_FLOW_LOG_FILE") {
        builder = builder.log_file(PathBuf::from(file));
    }
    Ok(builder.build())
}
