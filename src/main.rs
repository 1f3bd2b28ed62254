//! catalog-io - spreadsheet import/export for catalog collections.
//!
//! Export writes every asset of a collection, with the fields of a metadata
//! view, to a CSV or XLSX file. Import reads such a file back and updates
//! asset titles and metadata.
//!
//! ## Configuration
//!
//! Every flag can also be set through the environment:
//!
//! - `ICONIK_URL` - Catalog base URL (default: `https://app.iconik.io`)
//! - `APP_ID`, `AUTH_TOKEN` - API credentials
//! - `COLLECTION_ID`, `METADATA_VIEW_ID` - Target collection and view
//! - `OPERATION_TIMEOUT`, `OPERATION_RETRY_ATTEMPTS`, `OPERATION_RETRY_DELAY`
//! - `PER_PAGE` - Collection page size

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use bridge_desktop::{FileTableStore, ReqwestHttpClient};
use bridge_traits::{SystemClock, TableFormat};
use clap::Parser;
use core_runtime::config::{parse_duration, ExportSource, RunMode, SyncConfig};
use core_runtime::logging::{
    init_logging, strip_path, LogFormat, LogLevel, LogTarget, LoggingConfig,
};
use core_service::{CatalogService, RunReport, ServiceDependencies};
use provider_catalog::CatalogConnector;
use tracing::{error, info};

/// Sync catalog collection metadata with CSV/XLSX files.
#[derive(Debug, Parser)]
#[command(name = "catalog-io")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Catalog base URL.
    #[arg(long = "iconik-url", env = "ICONIK_URL")]
    base_url: Option<String>,

    /// Application ID.
    #[arg(long, env = "APP_ID")]
    app_id: String,

    /// Authentication token.
    #[arg(long, env = "AUTH_TOKEN", hide_env_values = true)]
    auth_token: String,

    /// Collection to export from or import into.
    #[arg(long, env = "COLLECTION_ID")]
    collection_id: String,

    /// Metadata view the columns map to.
    #[arg(long = "metadata-view-id", env = "METADATA_VIEW_ID")]
    view_id: String,

    /// Table to import (CSV or XLSX).
    #[arg(long, conflicts_with = "output")]
    input: Option<PathBuf>,

    /// Directory to export into.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Export file format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    output_format: OutputFormat,

    /// How export finds the collection's assets (traversal or search).
    #[arg(long, default_value = "traversal")]
    export_source: ExportSource,

    /// Collection page size (at most 500).
    #[arg(long, visible_alias = "per-page", env = "PER_PAGE")]
    page_size: Option<u32>,

    /// Upper bound for one catalog operation, retries included (e.g. 30s).
    #[arg(long, env = "OPERATION_TIMEOUT", value_parser = duration_arg)]
    operation_timeout: Option<Duration>,

    /// Additional attempts for rate-limited or failed requests.
    #[arg(long = "operation-retry-attempts", env = "OPERATION_RETRY_ATTEMPTS")]
    retry_attempts: Option<u32>,

    /// Wait before retrying a rate-limited request (e.g. 3s).
    #[arg(long = "operation-retry-delay", env = "OPERATION_RETRY_DELAY", value_parser = duration_arg)]
    retry_delay: Option<Duration>,

    /// Minimum log level.
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: LogLevel,

    /// Log line format (compact, pretty or json).
    #[arg(long, default_value = "compact")]
    log_format: LogFormat,

    /// Log file (default: catalog-io_<date>.log in the working directory).
    #[arg(long, conflicts_with = "log_stdout")]
    log_file: Option<PathBuf>,

    /// Log to the terminal instead of a file.
    #[arg(long)]
    log_stdout: bool,
}

/// Export file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Csv,
    Xlsx,
}

impl From<OutputFormat> for TableFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Csv => TableFormat::Csv,
            OutputFormat::Xlsx => TableFormat::Xlsx,
        }
    }
}

fn duration_arg(value: &str) -> std::result::Result<Duration, String> {
    parse_duration(value).map_err(|e| e.to_string())
}

impl Cli {
    fn logging_config(&self) -> LoggingConfig {
        let config = LoggingConfig::default()
            .with_level(self.log_level)
            .with_format(self.log_format);

        if self.log_stdout {
            config.with_target(LogTarget::Stderr)
        } else if let Some(path) = &self.log_file {
            config.with_target(LogTarget::File(path.clone()))
        } else {
            config
        }
    }

    fn sync_config(&self) -> Result<SyncConfig> {
        let mut builder = SyncConfig::builder()
            .app_id(&self.app_id)
            .auth_token(&self.auth_token)
            .collection_id(&self.collection_id)
            .view_id(&self.view_id)
            .output_format(self.output_format.into())
            .export_source(self.export_source);

        if let Some(url) = &self.base_url {
            builder = builder.base_url(url);
        }
        if let Some(input) = &self.input {
            builder = builder.input(input);
        }
        if let Some(output) = &self.output {
            builder = builder.output_dir(output);
        }
        if let Some(size) = self.page_size {
            builder = builder.page_size(size);
        }
        if let Some(timeout) = self.operation_timeout {
            builder = builder.operation_timeout(timeout);
        }
        if let Some(attempts) = self.retry_attempts {
            builder = builder.retry_attempts(attempts);
        }
        if let Some(delay) = self.retry_delay {
            builder = builder.retry_delay(delay);
        }

        Ok(builder.build()?)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.sync_config()?;

    init_logging(cli.logging_config()).context("Failed to initialize logging")?;
    info!(?config, "Starting run");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match runtime.block_on(run(&config)) {
        Ok(report) => {
            if let RunReport::Export(export) = &report {
                info!(file = %strip_path(&export.path.to_string_lossy()), "Export finished");
            }
            println!("{}", report);
            if report.is_aborted() {
                error!(collection_id = %config.collection_id, "Import stopped before its last row");
                bail!("The import of collection {} was stopped early", config.collection_id);
            }
            Ok(())
        }
        Err(e) => {
            error!(error = %format!("{:#}", e), "Run failed");
            Err(e)
        }
    }
}

async fn run(config: &SyncConfig) -> Result<RunReport> {
    let http_client =
        Arc::new(ReqwestHttpClient::new().context("Failed to create HTTP client")?);
    let catalog = Arc::new(CatalogConnector::from_config(http_client, config));

    let service = CatalogService::new(ServiceDependencies::new(
        catalog,
        Arc::new(FileTableStore::new()),
        Arc::new(SystemClock),
    ));

    let mode = match config.mode {
        RunMode::Import { .. } => "import",
        RunMode::Export { .. } => "export",
    };
    service
        .run(config)
        .await
        .with_context(|| format!("The {} of collection {} failed", mode, config.collection_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [&str; 9] = [
        "catalog-io",
        "--app-id",
        "app",
        "--auth-token",
        "token",
        "--collection-id",
        "coll",
        "--metadata-view-id",
        "view",
    ];

    fn parse(extra: &[&str]) -> Cli {
        Cli::parse_from(REQUIRED.iter().chain(extra.iter()))
    }

    #[test]
    fn test_export_flags() {
        let cli = parse(&[
            "--output",
            "exports",
            "--output-format",
            "xlsx",
            "--export-source",
            "search",
            "--per-page",
            "250",
            "--operation-timeout",
            "45s",
            "--operation-retry-delay",
            "500ms",
        ]);

        let config = cli.sync_config().unwrap();

        assert_eq!(config.page_size, 250);
        assert_eq!(config.operation_timeout, Duration::from_secs(45));
        assert_eq!(config.retry_delay, Duration::from_millis(500));
        assert_eq!(config.export_source, ExportSource::Search);
        assert_eq!(
            config.mode,
            RunMode::Export {
                output_dir: PathBuf::from("exports"),
                format: TableFormat::Xlsx,
            }
        );
    }

    #[test]
    fn test_import_and_output_conflict() {
        let result = Cli::try_parse_from(
            REQUIRED
                .iter()
                .chain(["--input", "in.csv", "--output", "out"].iter()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_logging_target() {
        let cli = parse(&["--input", "in.csv", "--log-stdout", "--log-format", "json"]);
        let logging = cli.logging_config();

        assert_eq!(logging.target, LogTarget::Stderr);
        assert_eq!(logging.format, LogFormat::Json);
        assert!(cli.sync_config().unwrap().is_import());
    }

    #[test]
    fn test_invalid_duration_is_rejected() {
        let result = Cli::try_parse_from(
            REQUIRED
                .iter()
                .chain(["--input", "in.csv", "--operation-timeout", "soon"].iter()),
        );
        assert!(result.is_err());
    }
}
