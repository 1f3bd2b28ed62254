//! # Sync Configuration Module
//!
//! Run configuration for a single import or export against the catalog.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! [`SyncConfig`]. Validation is fail-fast: `build()` rejects missing
//! credentials, an ambiguous run mode, and out-of-range limits before any
//! network or file work starts.
//!
//! ## Required Values
//!
//! - App ID and auth token for the catalog API
//! - Collection ID and metadata view ID
//! - Exactly one of an input file (import) or an output directory (export)
//!
//! ## Defaults
//!
//! | Setting | Default |
//! |---------|---------|
//! | Base URL | `https://app.iconik.io` |
//! | Operation timeout | 30s |
//! | Retry attempts | 1 |
//! | Retry delay | 3s |
//! | Page size | 500 (maximum) |
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::SyncConfig;
//!
//! let config = SyncConfig::builder()
//!     .app_id("app-id")
//!     .auth_token("token")
//!     .collection_id("c0ffee00-0000-0000-0000-000000000000")
//!     .view_id("view-id")
//!     .input("metadata.csv")
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use crate::logging::redact_if_sensitive;
use bridge_traits::http::RetryPolicy;
use bridge_traits::tabular::TableFormat;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://app.iconik.io";
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 1;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);
pub const DEFAULT_PAGE_SIZE: u32 = 500;
/// Largest page the catalog API accepts
pub const MAX_PAGE_SIZE: u32 = 500;

/// How export discovers the assets of a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportSource {
    /// Walk collection contents page by page, descending into sub-collections
    #[default]
    Traversal,
    /// Page through the search API filtered on the collection
    Search,
}

impl FromStr for ExportSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "traversal" | "contents" => Ok(Self::Traversal),
            "search" => Ok(Self::Search),
            other => Err(Error::Config(format!(
                "Unknown export source '{}'. Expected 'traversal' or 'search'.",
                other
            ))),
        }
    }
}

/// Direction of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Read a table and push its values to the catalog
    Import { input: PathBuf },
    /// Pull collection metadata and write it as a table under `output_dir`
    Export {
        output_dir: PathBuf,
        format: TableFormat,
    },
}

/// Configuration for one run
#[derive(Clone)]
pub struct SyncConfig {
    /// Catalog base URL, without trailing slash
    pub base_url: String,
    pub app_id: String,
    pub auth_token: String,
    pub collection_id: String,
    pub view_id: String,
    pub mode: RunMode,
    /// Upper bound for one catalog operation, retries included
    pub operation_timeout: Duration,
    /// Additional attempts after the first for retryable statuses
    pub retry_attempts: u32,
    /// Back-off applied before retrying a 429
    pub retry_delay: Duration,
    pub page_size: u32,
    pub export_source: ExportSource,
}

impl std::fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncConfig")
            .field("base_url", &self.base_url)
            .field("app_id", &self.app_id)
            .field(
                "auth_token",
                &redact_if_sensitive("auth_token", &self.auth_token),
            )
            .field("collection_id", &self.collection_id)
            .field("view_id", &self.view_id)
            .field("mode", &self.mode)
            .field("operation_timeout", &self.operation_timeout)
            .field("retry_attempts", &self.retry_attempts)
            .field("retry_delay", &self.retry_delay)
            .field("page_size", &self.page_size)
            .field("export_source", &self.export_source)
            .finish()
    }
}

impl SyncConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> SyncConfigBuilder {
        SyncConfigBuilder::default()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts, self.retry_delay)
    }

    pub fn is_import(&self) -> bool {
        matches!(self.mode, RunMode::Import { .. })
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("App ID", &self.app_id),
            ("Auth token", &self.auth_token),
            ("Collection ID", &self.collection_id),
            ("Metadata view ID", &self.view_id),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("{} is required.", name)));
            }
        }

        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "Base URL must start with http:// or https://, got '{}'.",
                self.base_url
            )));
        }

        if self.operation_timeout.is_zero() {
            return Err(Error::Config(
                "Operation timeout must be greater than zero.".to_string(),
            ));
        }

        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(Error::Config(format!(
                "Page size must be between 1 and {}, got {}.",
                MAX_PAGE_SIZE, self.page_size
            )));
        }

        Ok(())
    }
}

/// Builder for [`SyncConfig`]
#[derive(Debug, Default)]
pub struct SyncConfigBuilder {
    base_url: Option<String>,
    app_id: Option<String>,
    auth_token: Option<String>,
    collection_id: Option<String>,
    view_id: Option<String>,
    input: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    output_format: Option<TableFormat>,
    operation_timeout: Option<Duration>,
    retry_attempts: Option<u32>,
    retry_delay: Option<Duration>,
    page_size: Option<u32>,
    export_source: Option<ExportSource>,
}

impl SyncConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn collection_id(mut self, id: impl Into<String>) -> Self {
        self.collection_id = Some(id.into());
        self
    }

    pub fn view_id(mut self, id: impl Into<String>) -> Self {
        self.view_id = Some(id.into());
        self
    }

    /// Selects import mode reading from `path`.
    pub fn input<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.input = Some(path.into());
        self
    }

    /// Selects export mode writing into `dir`.
    pub fn output_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn output_format(mut self, format: TableFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }

    pub fn retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = Some(attempts);
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn export_source(mut self, source: ExportSource) -> Self {
        self.export_source = Some(source);
        self
    }

    /// Builds the final `SyncConfig`, validating it.
    pub fn build(self) -> Result<SyncConfig> {
        let mode = match (self.input, self.output_dir) {
            (Some(input), None) => RunMode::Import { input },
            (None, Some(output_dir)) => RunMode::Export {
                output_dir,
                format: self.output_format.unwrap_or_default(),
            },
            (Some(_), Some(_)) => {
                return Err(Error::Config(
                    "Provide either an input file (import) or an output directory (export), not both."
                        .to_string(),
                ))
            }
            (None, None) => {
                return Err(Error::Config(
                    "An input file (import) or an output directory (export) is required."
                        .to_string(),
                ))
            }
        };

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim()
            .trim_end_matches('/')
            .to_string();

        let config = SyncConfig {
            base_url,
            app_id: self.app_id.unwrap_or_default(),
            auth_token: self.auth_token.unwrap_or_default(),
            collection_id: self.collection_id.unwrap_or_default(),
            view_id: self.view_id.unwrap_or_default(),
            mode,
            operation_timeout: self.operation_timeout.unwrap_or(DEFAULT_OPERATION_TIMEOUT),
            retry_attempts: self.retry_attempts.unwrap_or(DEFAULT_RETRY_ATTEMPTS),
            retry_delay: self.retry_delay.unwrap_or(DEFAULT_RETRY_DELAY),
            page_size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            export_source: self.export_source.unwrap_or_default(),
        };

        config.validate()?;

        Ok(config)
    }
}

/// Parse a human duration: `500ms`, `30s`, `2m`, `1h`, or bare seconds (`30`).
pub fn parse_duration(input: &str) -> Result<Duration> {
    let trimmed = input.trim();
    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);

    let value: f64 = number
        .parse()
        .map_err(|_| Error::Config(format!("Invalid duration '{}'.", input)))?;

    let seconds = match unit.trim() {
        "ms" => value / 1000.0,
        "" | "s" => value,
        "m" => value * 60.0,
        "h" => value * 3600.0,
        other => {
            return Err(Error::Config(format!(
                "Invalid duration unit '{}' in '{}'. Use ms, s, m or h.",
                other, input
            )))
        }
    };

    Duration::try_from_secs_f64(seconds)
        .map_err(|_| Error::Config(format!("Invalid duration '{}'.", input)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn import_builder() -> SyncConfigBuilder {
        SyncConfig::builder()
            .app_id("app")
            .auth_token("secret-token")
            .collection_id("collection")
            .view_id("view")
            .input("metadata.csv")
    }

    #[test]
    fn test_defaults() {
        let config = import_builder().build().unwrap();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.operation_timeout, Duration::from_secs(30));
        assert_eq!(config.retry_attempts, 1);
        assert_eq!(config.retry_delay, Duration::from_secs(3));
        assert_eq!(config.page_size, 500);
        assert_eq!(config.export_source, ExportSource::Traversal);
        assert_eq!(
            config.mode,
            RunMode::Import {
                input: PathBuf::from("metadata.csv")
            }
        );
        assert!(config.is_import());
    }

    #[test]
    fn test_export_mode() {
        let config = SyncConfig::builder()
            .app_id("app")
            .auth_token("token")
            .collection_id("collection")
            .view_id("view")
            .output_dir("/tmp/out")
            .output_format(TableFormat::Xlsx)
            .base_url("https://catalog.example.com/")
            .build()
            .unwrap();

        assert_eq!(config.base_url, "https://catalog.example.com");
        assert_eq!(
            config.mode,
            RunMode::Export {
                output_dir: PathBuf::from("/tmp/out"),
                format: TableFormat::Xlsx
            }
        );
    }

    #[test]
    fn test_mode_is_exclusive() {
        let both = import_builder().output_dir("/tmp/out").build();
        assert!(matches!(both, Err(Error::Config(msg)) if msg.contains("not both")));

        let neither = SyncConfig::builder()
            .app_id("app")
            .auth_token("token")
            .collection_id("collection")
            .view_id("view")
            .build();
        assert!(matches!(neither, Err(Error::Config(msg)) if msg.contains("required")));
    }

    #[test]
    fn test_missing_credentials() {
        let result = SyncConfig::builder()
            .auth_token("token")
            .collection_id("collection")
            .view_id("view")
            .input("in.csv")
            .build();

        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("App ID")));
    }

    #[test]
    fn test_page_size_bounds() {
        assert!(import_builder().page_size(0).build().is_err());
        assert!(import_builder().page_size(501).build().is_err());
        assert_eq!(import_builder().page_size(50).build().unwrap().page_size, 50);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(import_builder()
            .operation_timeout(Duration::ZERO)
            .build()
            .is_err());
    }

    #[test]
    fn test_base_url_scheme() {
        assert!(import_builder().base_url("app.iconik.io").build().is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = import_builder().build().unwrap();
        let debug = format!("{:?}", config);

        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_retry_policy_from_config() {
        let config = import_builder()
            .retry_attempts(3)
            .retry_delay(Duration::from_millis(250))
            .build()
            .unwrap();

        assert_eq!(
            config.retry_policy(),
            RetryPolicy::new(3, Duration::from_millis(250))
        );
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("30").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration(" 1.5s ").unwrap(), Duration::from_millis(1500));
        assert!(parse_duration("soon").is_err());
        assert!(parse_duration("10d").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn test_export_source_from_str() {
        assert_eq!("search".parse::<ExportSource>().unwrap(), ExportSource::Search);
        assert_eq!(
            "Traversal".parse::<ExportSource>().unwrap(),
            ExportSource::Traversal
        );
        assert!("index".parse::<ExportSource>().is_err());
    }
}
