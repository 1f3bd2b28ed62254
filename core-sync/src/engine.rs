//! # Synchronization Engine
//!
//! Applies reconciled rows to the catalog, one row at a time.
//!
//! ## Per row
//!
//! 1. Resolve the target asset: the `id` column if it is a valid asset id
//!    the catalog knows, otherwise the collection asset that has a file
//!    named like the `original_name` column.
//! 2. Build the metadata payload from the remaining columns. Cells are split
//!    on commas; blank values are dropped; every value is checked against
//!    [`FieldRules`] and the first failure fails the row.
//! 3. Update the title, then the metadata.
//!
//! A failed row is recorded in [`SyncOutcome`] and the run moves on. Updates
//! are not rolled back: a title written before a failed metadata update
//! stays written. A permission failure ends the run, since every later row
//! would fail the same way; the outcome then carries a [`RunAbort`] next to
//! the rows already applied.

use crate::error::{Result, SyncError};
use crate::reconcile::{Reconciliation, FIXED_COLUMNS, ID_COLUMN, ORIGINAL_NAME_COLUMN, TITLE_COLUMN};
use crate::validate::{is_valid_asset_id, FieldRules};
use bridge_traits::catalog::{Asset, CatalogProvider, MetadataUpdate};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A row that could not be applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    /// Line in the input file (the header is line 1)
    pub row: usize,
    /// Resolved asset id, or the `id` cell when resolution failed
    pub asset_id: String,
    pub title: String,
    pub original_name: String,
    pub reason: String,
}

impl RowFailure {
    /// Asset id, or a best-effort label when the row has none.
    pub fn label(&self) -> String {
        if !self.asset_id.is_empty() {
            self.asset_id.clone()
        } else if !self.original_name.is_empty() {
            self.original_name.clone()
        } else {
            format!("row {}", self.row)
        }
    }
}

/// Why a run stopped before its last row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunAbort {
    /// Line of the row that stopped the run
    pub row: usize,
    pub reason: String,
    /// Rows after `row` that were never attempted
    pub remaining: usize,
}

/// Result of one synchronization run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    pub attempted: usize,
    pub succeeded: usize,
    pub failures: Vec<RowFailure>,
    pub aborted: Option<RunAbort>,
}

impl SyncOutcome {
    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }

    /// Failure reasons keyed by [`RowFailure::label`]
    pub fn failures_by_asset(&self) -> BTreeMap<String, String> {
        self.failures
            .iter()
            .map(|f| (f.label(), f.reason.clone()))
            .collect()
    }
}

/// A row error, with the asset it resolved to if it got that far
struct RowError {
    asset_id: Option<String>,
    error: SyncError,
}

impl RowError {
    fn unresolved(error: SyncError) -> Self {
        Self {
            asset_id: None,
            error,
        }
    }

    fn for_asset(asset_id: &str, error: impl Into<SyncError>) -> Self {
        Self {
            asset_id: Some(asset_id.to_string()),
            error: error.into(),
        }
    }
}

pub struct SyncEngine {
    catalog: Arc<dyn CatalogProvider>,
    rules: FieldRules,
}

impl SyncEngine {
    /// Engine with the built-in field rules
    pub fn new(catalog: Arc<dyn CatalogProvider>) -> Self {
        Self::with_rules(catalog, FieldRules::builtin())
    }

    pub fn with_rules(catalog: Arc<dyn CatalogProvider>, rules: FieldRules) -> Self {
        Self { catalog, rules }
    }

    /// Apply every data row of `reconciliation` to assets in `view_id`.
    ///
    /// `collection_assets` is the traversal result used for filename
    /// resolution. Row errors are recorded per row. An error that is not
    /// row-level (a permission failure) is recorded for its row and stops
    /// the run, leaving [`SyncOutcome::aborted`] set.
    pub async fn synchronize(
        &self,
        reconciliation: &Reconciliation,
        view_id: &str,
        collection_assets: &[Asset],
    ) -> SyncOutcome {
        let mut outcome = SyncOutcome::default();
        let rows = reconciliation.data_rows();

        for (index, row) in rows.iter().enumerate() {
            let line = index + 2;
            outcome.attempted += 1;

            let cell = |column: usize| row.get(column).map(|c| c.trim()).unwrap_or_default();

            let RowError { asset_id, error } = match self
                .sync_row(reconciliation, row, view_id, collection_assets)
                .await
            {
                Ok(asset_id) => {
                    outcome.succeeded += 1;
                    info!(row = line, asset_id = %asset_id, "Row applied");
                    continue;
                }
                Err(e) => e,
            };

            let failure = RowFailure {
                row: line,
                asset_id: asset_id.unwrap_or_else(|| cell(ID_COLUMN).to_string()),
                title: cell(TITLE_COLUMN).to_string(),
                original_name: cell(ORIGINAL_NAME_COLUMN).to_string(),
                reason: error.to_string(),
            };

            if error.is_row_level() {
                warn!(row = line, asset_id = %failure.asset_id, error = %error, "Row failed");
                outcome.failures.push(failure);
                continue;
            }

            let remaining = rows.len() - index - 1;
            warn!(
                row = line,
                attempted = outcome.attempted,
                succeeded = outcome.succeeded,
                remaining,
                error = %error,
                "Stopping synchronization"
            );
            outcome.failures.push(failure);
            outcome.aborted = Some(RunAbort {
                row: line,
                reason: error.to_string(),
                remaining,
            });
            break;
        }

        info!(
            attempted = outcome.attempted,
            succeeded = outcome.succeeded,
            failed = outcome.failed_count(),
            aborted = outcome.is_aborted(),
            "Synchronization finished"
        );
        outcome
    }

    async fn sync_row(
        &self,
        reconciliation: &Reconciliation,
        row: &[String],
        view_id: &str,
        collection_assets: &[Asset],
    ) -> std::result::Result<String, RowError> {
        let cell = |column: usize| row.get(column).map(|c| c.trim()).unwrap_or_default();

        let asset_id = self
            .resolve_asset(cell(ID_COLUMN), cell(ORIGINAL_NAME_COLUMN), collection_assets)
            .await
            .map_err(RowError::unresolved)?;
        let update = self
            .build_update(reconciliation, row)
            .map_err(|e| RowError::for_asset(&asset_id, e))?;

        let title = cell(TITLE_COLUMN);
        if title.is_empty() {
            debug!(asset_id = %asset_id, "Blank title, leaving it unchanged");
        } else {
            self.catalog
                .patch_asset(&asset_id, title)
                .await
                .map_err(|e| RowError::for_asset(&asset_id, e))?;
        }

        if update.is_empty() {
            debug!(asset_id = %asset_id, "No metadata values to send");
        } else {
            self.catalog
                .update_metadata_in_asset(view_id, &asset_id, &update)
                .await
                .map_err(|e| RowError::for_asset(&asset_id, e))?;
        }

        Ok(asset_id)
    }

    /// Resolve by id first, then by original filename.
    async fn resolve_asset(
        &self,
        id: &str,
        original_name: &str,
        collection_assets: &[Asset],
    ) -> Result<String> {
        let by_id = if !is_valid_asset_id(id) {
            "not a valid asset ID".to_string()
        } else {
            match self.catalog.get_asset(id).await {
                Ok(_) => return Ok(id.to_string()),
                Err(e) if e.is_permission_denied() => return Err(e.into()),
                Err(e) if e.status() == Some(404) => {
                    format!("asset {} not found in the catalog", id)
                }
                Err(e) => e.to_string(),
            }
        };

        if !original_name.is_empty() {
            if let Some(asset) = collection_assets
                .iter()
                .find(|a| a.has_file_named(original_name))
            {
                debug!(original_name, asset_id = %asset.id, reason = %by_id, "Resolved asset by filename");
                return Ok(asset.id.clone());
            }
        }

        Err(SyncError::Resolution {
            by_id,
            by_filename: format!("file {} does not exist in the given collection", original_name),
        })
    }

    fn build_update(&self, reconciliation: &Reconciliation, row: &[String]) -> Result<MetadataUpdate> {
        let names = reconciliation.names();
        let labels = reconciliation.labels();
        let mut update = MetadataUpdate::new();

        for column in FIXED_COLUMNS.len()..names.len() {
            let cell = row.get(column).map(String::as_str).unwrap_or_default();
            let values: Vec<String> = cell
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect();
            if values.is_empty() {
                continue;
            }

            let label = labels.get(column).map(String::as_str).unwrap_or_default();
            for value in &values {
                self.rules.validate(label, value)?;
            }
            update.insert(names[column].clone(), values);
        }

        Ok(update)
    }
}
