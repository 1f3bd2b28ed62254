//! Core service façade.
//!
//! This crate wires host-provided bridge implementations (catalog access,
//! table files, clock) into the import and export pipelines. The binary
//! builds a [`ServiceDependencies`] bundle from the desktop bridges; tests
//! substitute in-memory ones.

pub mod error;
pub mod report;

pub use error::{CoreError, Result};
pub use report::{ExportReport, ImportReport, RunReport};

use std::path::Path;
use std::sync::Arc;

use bridge_traits::{
    catalog::{Asset, CatalogProvider},
    tabular::{TableFormat, TableStore},
    time::Clock,
};
use chrono::Local;
use core_runtime::config::{ExportSource, RunMode, SyncConfig};
use core_sync::{
    format_assets, reconcile, report_file_name, validate_header, CollectionTraversal,
    SyncEngine, TraversalState,
};
use tracing::{debug, info, instrument};

/// Aggregated handle to all bridge dependencies the service requires.
pub struct ServiceDependencies {
    pub catalog: Arc<dyn CatalogProvider>,
    pub tables: Arc<dyn TableStore>,
    pub clock: Arc<dyn Clock>,
}

impl ServiceDependencies {
    /// Construct a dependency bundle from explicit bridge handles.
    pub fn new(
        catalog: Arc<dyn CatalogProvider>,
        tables: Arc<dyn TableStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog,
            tables,
            clock,
        }
    }
}

/// Primary façade exposed to the binary.
#[derive(Clone)]
pub struct CatalogService {
    deps: Arc<ServiceDependencies>,
}

impl CatalogService {
    /// Create a new service from the provided dependencies.
    pub fn new(deps: ServiceDependencies) -> Self {
        Self {
            deps: Arc::new(deps),
        }
    }

    /// Run whichever mode `config` selects.
    pub async fn run(&self, config: &SyncConfig) -> Result<RunReport> {
        match config.mode {
            RunMode::Import { .. } => self.run_import(config).await.map(RunReport::Import),
            RunMode::Export { .. } => self.run_export(config).await.map(RunReport::Export),
        }
    }

    /// Read a table and apply its rows to the collection's assets.
    ///
    /// The header is checked before any catalog call is made.
    #[instrument(skip(self, config), fields(collection_id = %config.collection_id, view_id = %config.view_id))]
    pub async fn run_import(&self, config: &SyncConfig) -> Result<ImportReport> {
        let RunMode::Import { input } = &config.mode else {
            return Err(CoreError::WrongMode {
                operation: "run_import",
                mode: "import",
            });
        };

        let rows = self.deps.tables.read_table(input).await?;
        validate_header(&rows)?;
        info!(path = %input.display(), rows = rows.len(), "Input table loaded");

        let view = self.deps.catalog.get_metadata_view(&config.view_id).await?;
        let reconciliation = reconcile(&view.fields, &rows);

        let traversal = CollectionTraversal::new(self.deps.catalog.clone(), config.page_size);
        let mut state = TraversalState::new();
        state
            .visited_collections
            .insert(config.collection_id.clone());
        let assets = traversal
            .traverse(&config.collection_id, 1, &mut state)
            .await?;
        info!(assets = assets.len(), "Collection assets discovered");

        let outcome = SyncEngine::new(self.deps.catalog.clone())
            .synchronize(&reconciliation, &config.view_id, &assets)
            .await;
        if !outcome.failures.is_empty() {
            debug!(failures = ?outcome.failures_by_asset(), "Rows not applied");
        }

        Ok(ImportReport {
            input: input.clone(),
            view_name: view.name,
            unmatched_labels: reconciliation.unmatched_labels,
            failed_collections: state.failed_collections,
            outcome,
        })
    }

    /// Write the collection's assets and their view metadata to a new file
    /// under the output directory.
    #[instrument(skip(self, config), fields(collection_id = %config.collection_id, view_id = %config.view_id))]
    pub async fn run_export(&self, config: &SyncConfig) -> Result<ExportReport> {
        let RunMode::Export { output_dir, format } = &config.mode else {
            return Err(CoreError::WrongMode {
                operation: "run_export",
                mode: "export",
            });
        };

        let view = self.deps.catalog.get_metadata_view(&config.view_id).await?;
        let collection = self.deps.catalog.get_collection(&config.collection_id).await?;

        let assets = self.discover_assets(config).await?;
        let export = format_assets(&view, &assets);

        let timestamp = self.deps.clock.now().with_timezone(&Local);
        let file_name = report_file_name(&collection.id, &collection.title, &timestamp, *format);
        let path = output_dir.join(file_name);
        self.write_export(&path, *format, &export.header_rows(), &export.rows)
            .await?;

        info!(path = %path.display(), assets = assets.len(), "Export written");
        Ok(ExportReport {
            path,
            collection_title: collection.title,
            asset_count: export.rows.len(),
            column_count: export.header_labels.len(),
        })
    }

    async fn discover_assets(&self, config: &SyncConfig) -> Result<Vec<Asset>> {
        let traversal = CollectionTraversal::new(self.deps.catalog.clone(), config.page_size);

        match config.export_source {
            // Search hits already carry their metadata
            ExportSource::Search => Ok(traversal.discover_by_search(&config.collection_id).await?),
            ExportSource::Traversal => {
                let mut assets = traversal.collect_assets(&config.collection_id).await?;
                for asset in &mut assets {
                    asset.metadata = self
                        .deps
                        .catalog
                        .get_asset_metadata(&config.view_id, &asset.id)
                        .await?;
                }
                Ok(assets)
            }
        }
    }

    async fn write_export(
        &self,
        path: &Path,
        format: TableFormat,
        header_rows: &[Vec<String>],
        data_rows: &[Vec<String>],
    ) -> Result<()> {
        info!(path = %path.display(), format = format.extension(), "Writing export");
        self.deps
            .tables
            .write_table(path, header_rows, data_rows)
            .await?;
        Ok(())
    }
}
