//! # Logging & Tracing Infrastructure
//!
//! Provides structured logging with the `tracing` crate, supporting:
//! - Pretty, JSON and compact output formats
//! - Module-level filtering
//! - A dated log file sink (default) or stderr
//! - Redaction helpers for tokens and paths
//!
//! ## Overview
//!
//! Diagnostics go to the log sink only. Progress lines and the final run
//! summary are written to stdout by the binary and never pass through here,
//! so a quiet log level does not hide results from the operator.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::logging::{init_logging, LogFormat, LogLevel, LogTarget, LoggingConfig};
//!
//! fn main() -> core_runtime::Result<()> {
//!     let config = LoggingConfig::default()
//!         .with_format(LogFormat::Compact)
//!         .with_level(LogLevel::Debug)
//!         .with_target(LogTarget::Stderr);
//!
//!     init_logging(config)?;
//!
//!     tracing::info!("Application started");
//!     Ok(())
//! }
//! ```

use crate::error::{Error, Result};
use chrono::NaiveDate;
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::Subscriber;
use tracing_subscriber::{
    filter::EnvFilter,
    fmt::writer::BoxMakeWriter,
    layer::SubscriberExt,
    registry::LookupSpan,
    Layer,
};

/// Prefix of the default log file name
pub const LOG_FILE_PREFIX: &str = "catalog-io";

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(Error::Config(format!("Unknown log level '{}'.", other))),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line format
    Pretty,
    /// Structured JSON format for machine parsing
    Json,
    /// Single-line format
    #[default]
    Compact,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            other => Err(Error::Config(format!("Unknown log format '{}'.", other))),
        }
    }
}

/// Where log lines are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Append to a file, created if missing
    File(PathBuf),
    Stderr,
}

/// `catalog-io_{YYYY-MM-DD}.log`
pub fn default_log_file_name(date: NaiveDate) -> String {
    format!("{}_{}.log", LOG_FILE_PREFIX, date.format("%Y-%m-%d"))
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Output format
    pub format: LogFormat,
    /// Minimum log level
    pub level: LogLevel,
    /// Custom filter string (e.g., "core_sync=debug,provider_catalog=trace")
    pub filter: Option<String>,
    /// Output destination
    pub target: LogTarget,
    /// Include span enter/exit context
    pub enable_spans: bool,
    /// Display target module in logs
    pub display_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::Info,
            filter: None,
            target: LogTarget::File(PathBuf::from(default_log_file_name(
                chrono::Local::now().date_naive(),
            ))),
            enable_spans: true,
            display_target: true,
        }
    }
}

impl LoggingConfig {
    /// Set log format
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set minimum log level
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Set custom filter string
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Set output destination
    pub fn with_target(mut self, target: LogTarget) -> Self {
        self.target = target;
        self
    }

    /// Enable or disable span contexts
    pub fn with_spans(mut self, enable: bool) -> Self {
        self.enable_spans = enable;
        self
    }

    /// Enable or disable module target display
    pub fn with_display_target(mut self, display: bool) -> Self {
        self.display_target = display;
        self
    }
}

/// Initialize the logging system
///
/// This should be called once during application startup. Subsequent calls
/// will return an error.
///
/// # Errors
///
/// Returns an error if:
/// - Logging is already initialized
/// - The filter string is invalid
/// - The log file cannot be opened
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let subscriber = build_subscriber(&config)?;

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))
}

/// Assemble the subscriber without installing it.
pub fn build_subscriber(config: &LoggingConfig) -> Result<impl Subscriber + Send + Sync> {
    let filter = build_filter(config)?;
    let writer = make_writer(&config.target)?;
    let ansi = matches!(config.target, LogTarget::Stderr);

    Ok(tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer(config, writer, ansi)))
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let level = config.level.as_str();

    let filter_string = if let Some(custom_filter) = &config.filter {
        custom_filter.clone()
    } else {
        // Our crates at the configured level, dependencies at warn
        format!(
            "catalog_io={level},core_runtime={level},core_sync={level},core_service={level},\
             provider_catalog={level},bridge_desktop={level},h2=warn,hyper=warn,reqwest=warn"
        )
    };

    EnvFilter::try_new(filter_string)
        .map_err(|e| Error::Config(format!("Invalid log filter: {}", e)))
}

fn make_writer(target: &LogTarget) -> Result<BoxMakeWriter> {
    match target {
        LogTarget::Stderr => Ok(BoxMakeWriter::new(io::stderr)),
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    Error::Config(format!(
                        "Failed to open log file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
            Ok(BoxMakeWriter::new(Mutex::new(file)))
        }
    }
}

fn fmt_layer<S>(
    config: &LoggingConfig,
    writer: BoxMakeWriter,
    ansi: bool,
) -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let span_events = if config.enable_spans {
        tracing_subscriber::fmt::format::FmtSpan::CLOSE
    } else {
        tracing_subscriber::fmt::format::FmtSpan::NONE
    };

    match config.format {
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_ansi(ansi)
            .with_target(config.display_target)
            .with_span_events(span_events)
            .with_writer(writer)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(config.enable_spans)
            .with_span_list(config.enable_spans)
            .with_target(config.display_target)
            .with_writer(writer)
            .boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .with_ansi(ansi)
            .with_target(config.display_target)
            .with_span_events(span_events)
            .with_writer(writer)
            .boxed(),
    }
}

/// Helper function to redact sensitive field values
///
/// ```ignore
/// use tracing::info;
/// use core_runtime::logging::redact_if_sensitive;
///
/// info!(auth_token = %redact_if_sensitive("auth_token", token), "Using credentials");
/// ```
pub fn redact_if_sensitive(field_name: &str, value: &str) -> String {
    const SENSITIVE_FIELDS: &[&str] = &[
        "token",
        "password",
        "secret",
        "api_key",
        "authorization",
        "bearer",
    ];

    let field_lower = field_name.to_lowercase();
    if SENSITIVE_FIELDS.iter().any(|&f| field_lower.contains(f)) {
        "[REDACTED]".to_string()
    } else if value.contains('@') && value.contains('.') {
        // Likely an email - keep first char only
        match value.find('@') {
            Some(at_pos) => format!("{}***@[REDACTED]", &value[..1.min(at_pos)]),
            None => value.to_string(),
        }
    } else {
        value.to_string()
    }
}

/// Strip full file paths to basename only
///
/// ```ignore
/// info!(file = %strip_path("/home/ops/exports/report.csv"), "Wrote report");
/// // Logs: file="report.csv"
/// ```
pub fn strip_path(path: &str) -> &str {
    path.rsplit('/')
        .next()
        .unwrap_or(path)
        .rsplit('\\')
        .next()
        .unwrap_or(path)
}
