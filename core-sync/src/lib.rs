//! # Catalog Sync Module
//!
//! Moves metadata between spreadsheets and the asset catalog.
//!
//! ## Overview
//!
//! Export walks a collection tree and renders its assets against a metadata
//! view. Import matches the spreadsheet's columns against the view, resolves
//! each row to an asset and applies title and metadata updates, collecting
//! per-row failures instead of stopping.
//!
//! ## Components
//!
//! - **Collection Traversal** (`traversal`): Paged, deduplicating walk of a collection tree, plus search-based discovery
//! - **Schema Reconciliation** (`reconcile`): Matches input headers against view field labels
//! - **Field Validation** (`validate`): Per-label value rules and asset id syntax
//! - **Synchronization Engine** (`engine`): Row-by-row resolution, validation and updates
//! - **Tabular Formatter** (`export`): Header and row rendering for export files

pub mod engine;
pub mod error;
pub mod export;
pub mod reconcile;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traversal;
pub mod validate;

pub use engine::{RowFailure, RunAbort, SyncEngine, SyncOutcome};
pub use error::{Result, SyncError};
pub use export::{format_assets, report_file_name, TabularExport};
pub use reconcile::{reconcile, validate_header, Reconciliation, FIXED_COLUMNS};
pub use traversal::{CollectionTraversal, TraversalState};
pub use validate::{is_valid_asset_id, FieldRule, FieldRules};
