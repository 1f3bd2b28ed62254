//! Integration tests for configuration and logging

use bridge_traits::tabular::TableFormat;
use core_runtime::config::{parse_duration, ExportSource, RunMode, SyncConfig};
use core_runtime::logging::{build_subscriber, LogFormat, LogTarget, LoggingConfig};
use std::time::Duration;

#[test]
fn test_config_from_cli_style_values() {
    // Values arrive as strings from flags/env and are parsed before building
    let config = SyncConfig::builder()
        .app_id("app")
        .auth_token("token")
        .collection_id("collection")
        .view_id("view")
        .output_dir("exports")
        .output_format(TableFormat::from_path("report.xlsx".as_ref()))
        .operation_timeout(parse_duration("45s").unwrap())
        .retry_delay(parse_duration("1500ms").unwrap())
        .export_source("search".parse::<ExportSource>().unwrap())
        .build()
        .unwrap();

    assert_eq!(config.operation_timeout, Duration::from_secs(45));
    assert_eq!(config.retry_delay, Duration::from_millis(1500));
    assert_eq!(config.export_source, ExportSource::Search);
    assert!(matches!(
        config.mode,
        RunMode::Export {
            format: TableFormat::Xlsx,
            ..
        }
    ));
}

#[test]
fn test_json_log_lines_go_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog-io_test.log");

    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_filter("info")
        .with_target(LogTarget::File(path.clone()));

    tracing::subscriber::with_default(build_subscriber(&config).unwrap(), || {
        tracing::warn!(asset_id = "a1", "row failed");
        tracing::debug!("filtered out");
    });

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<serde_json::Value> = contents
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["level"], "WARN");
    assert_eq!(lines[0]["message"], "row failed");
    assert_eq!(lines[0]["asset_id"], "a1");
}
