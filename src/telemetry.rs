//! Tracing subscriber setup.
//!
//! The client logs through `tracing` under the `tapi_client` target. These
//! helpers install a `tracing-subscriber` that shows those logs, for
//! applications that do not configure one themselves.
//!
//! ```rust,ignore
//! use tapi_client::telemetry::{init_subscriber, OutputFormat, SubscriberConfig};
//!
//! let config = SubscriberConfig::builder()
//!     .log_level(tracing::Level::DEBUG)
//!     .output_format(OutputFormat::Json)
//!     .build();
//! let _guard = init_subscriber(config)?;
//! ```

use crate::defaults;
use crate::error::ApiError;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

/// Output format for tracing logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// One JSON object per line
    Json,
    /// JSON without span lists
    JsonCompact,
}

impl std::str::FromStr for OutputFormat {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "json-compact" => Ok(Self::JsonCompact),
            _ => Err(ApiError::Configuration(format!(
                "Invalid log format: {s}. Valid options: text, json, json-compact"
            ))),
        }
    }
}

/// Configuration for the tracing subscriber
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    pub log_level: tracing::Level,
    pub output_format: OutputFormat,
    /// Write to stderr. Ignored when `log_file` is set.
    pub enable_console: bool,
    /// Append logs to this file instead of the console.
    pub log_file: Option<PathBuf>,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            log_level: tracing::Level::INFO,
            output_format: OutputFormat::Text,
            enable_console: true,
            log_file: None,
        }
    }
}

impl SubscriberConfig {
    pub fn builder() -> SubscriberConfigBuilder {
        SubscriberConfigBuilder::default()
    }

    /// Debug-level text output on the console.
    pub fn debug() -> Self {
        Self {
            log_level: tracing::Level::DEBUG,
            ..Self::default()
        }
    }

    /// Filter directive for the crate's targets.
    pub fn filter_directive(&self) -> String {
        format!(
            "tapi_client={}",
            self.log_level.as_str().to_ascii_lowercase()
        )
    }
}

/// Builder for [`SubscriberConfig`]
#[derive(Debug, Default)]
pub struct SubscriberConfigBuilder {
    log_level: Option<tracing::Level>,
    output_format: Option<OutputFormat>,
    enable_console: Option<bool>,
    log_file: Option<PathBuf>,
}

impl SubscriberConfigBuilder {
    pub fn log_level(mut self, level: tracing::Level) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Set the log level from its name (`trace` .. `error`, any case).
    pub fn log_level_str(mut self, level: &str) -> Result<Self, ApiError> {
        let parsed = level.parse::<tracing::Level>().map_err(|_| {
            ApiError::Configuration(format!(
                "Invalid log level: {level}. Valid options: trace, debug, info, warn, error"
            ))
        })?;
        self.log_level = Some(parsed);
        Ok(self)
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn enable_console(mut self, enable: bool) -> Self {
        self.enable_console = Some(enable);
        self
    }

    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    pub fn build(self) -> SubscriberConfig {
        SubscriberConfig {
            log_level: self.log_level.unwrap_or(tracing::Level::INFO),
            output_format: self.output_format.unwrap_or_default(),
            enable_console: self.enable_console.unwrap_or(true),
            log_file: self.log_file,
        }
    }
}

/// Install a global subscriber for the given configuration.
///
/// Returns the file writer's guard when `log_file` is set; keep it alive for
/// as long as logs should be flushed. A subscriber that is already installed
/// is left in place and reported as success.
pub fn init_subscriber(config: SubscriberConfig) -> Result<Option<WorkerGuard>, ApiError> {
    let filter = EnvFilter::try_new(config.filter_directive())
        .map_err(|e| ApiError::Configuration(format!("Invalid log filter: {e}")))?;

    if let Some(path) = &config.log_file {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = path.file_name().ok_or_else(|| {
            ApiError::Configuration(format!("Invalid log file path: {}", path.display()))
        })?;
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        install(filter, config.output_format, writer, false)?;
        return Ok(Some(guard));
    }

    if config.enable_console {
        install(filter, config.output_format, std::io::stderr, true)?;
    }
    Ok(None)
}

fn install<W>(
    filter: EnvFilter,
    format: OutputFormat,
    writer: W,
    ansi: bool,
) -> Result<(), ApiError>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(true);
    let result = match format {
        OutputFormat::Json => builder
            .with_thread_ids(true)
            .with_thread_names(true)
            .json()
            .try_init(),
        OutputFormat::JsonCompact => builder
            .with_thread_ids(true)
            .json()
            .with_span_list(false)
            .flatten_event(true)
            .try_init(),
        OutputFormat::Text => builder.with_ansi(ansi).try_init(),
    };

    match result {
        Ok(()) => Ok(()),
        // Another subscriber owns the global dispatcher; keep it.
        Err(e) if is_already_installed(&e.to_string()) => Ok(()),
        Err(e) => Err(ApiError::Configuration(format!(
            "Failed to initialize tracing: {e}"
        ))),
    }
}

fn is_already_installed(message: &str) -> bool {
    message.contains("already been set") || message.contains("already initialized")
}

pub fn init_default() -> Result<Option<WorkerGuard>, ApiError> {
    init_subscriber(SubscriberConfig::default())
}

pub fn init_debug() -> Result<Option<WorkerGuard>, ApiError> {
    init_subscriber(SubscriberConfig::debug())
}

/// Configuration from environment variables:
/// - `TAPI_LOG_LEVEL`: trace, debug, info, warn, error
/// - `TAPI_LOG_FORMAT`: text, json, json-compact
/// - `TAPI_LOG_FILE`: log file path
pub fn config_from_env() -> Result<SubscriberConfig, ApiError> {
    let mut builder = SubscriberConfig::builder();
    if let Ok(level) = std::env::var(defaults::env::LOG_LEVEL) {
        builder = builder.log_level_str(&level)?;
    }
    if let Ok(format) = std::env::var(defaults::env::LOG_FORMAT) {
        builder = builder.output_format(format.parse()?);
    }
    if let Ok(path) = std::env::var(defaults::env::LOG_FILE) {
        builder = builder.log_file(path);
    }
    Ok(builder.build())
}

pub fn init_from_env() -> Result<Option<WorkerGuard>, ApiError> {
    init_subscriber(config_from_env()?)
}
