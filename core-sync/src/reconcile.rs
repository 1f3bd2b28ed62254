//! # Schema Reconciliation
//!
//! Matches the column headers of an imported table against the labels of a
//! metadata view. Columns without a matching view field are reported, not
//! rejected.
//!
//! The result uses a two-row header: machine names, then labels, then the
//! data rows projected onto the matched columns in input order.

use crate::error::{Result, SyncError};
use bridge_traits::catalog::ViewField;
use tracing::{debug, info};

/// Leading columns every import/export table carries, in order.
pub const FIXED_COLUMNS: [&str; 4] = ["id", "original_name", "size", "title"];

pub const ID_COLUMN: usize = 0;
pub const ORIGINAL_NAME_COLUMN: usize = 1;
pub const SIZE_COLUMN: usize = 2;
pub const TITLE_COLUMN: usize = 3;

/// Reject tables whose header does not start with [`FIXED_COLUMNS`].
pub fn validate_header(rows: &[Vec<String>]) -> Result<()> {
    let header = rows
        .first()
        .ok_or_else(|| SyncError::Schema("the file is empty".to_string()))?;

    let prefix: Vec<&str> = header
        .iter()
        .take(FIXED_COLUMNS.len())
        .map(|cell| cell.trim())
        .collect();

    if prefix != FIXED_COLUMNS {
        return Err(SyncError::Schema(format!(
            "the first columns must be {}, found {}",
            FIXED_COLUMNS.join(", "),
            prefix.join(", ")
        )));
    }

    Ok(())
}

/// Imported table restricted to the columns the view knows about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// `[0]` machine names, `[1]` labels, `[2..]` data
    pub matched_rows: Vec<Vec<String>>,
    /// Header labels with no counterpart in the view, in input order
    pub unmatched_labels: Vec<String>,
}

impl Reconciliation {
    pub fn names(&self) -> &[String] {
        self.matched_rows.first().map(Vec::as_slice).unwrap_or_default()
    }

    pub fn labels(&self) -> &[String] {
        self.matched_rows.get(1).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn data_rows(&self) -> &[Vec<String>] {
        self.matched_rows.get(2..).unwrap_or_default()
    }
}

/// Project `rows` (header first) onto the fields of a metadata view.
///
/// Never fails: unknown headers end up in
/// [`Reconciliation::unmatched_labels`]. Data rows shorter than the header
/// are padded with empty cells.
pub fn reconcile(view_fields: &[ViewField], rows: &[Vec<String>]) -> Reconciliation {
    let fixed: Vec<String> = FIXED_COLUMNS.iter().map(|c| c.to_string()).collect();
    let mut names = fixed.clone();
    let mut labels = fixed;
    let mut positions: Vec<usize> = (0..FIXED_COLUMNS.len()).collect();
    let mut unmatched_labels = Vec::new();

    let header = rows.first().map(Vec::as_slice).unwrap_or_default();
    for (index, label) in header.iter().enumerate().skip(FIXED_COLUMNS.len()) {
        let label = label.trim();
        let field = view_fields
            .iter()
            .filter(|f| !f.is_separator())
            .find(|f| f.label == label);

        match field {
            Some(field) => {
                names.push(field.name.clone());
                labels.push(field.label.clone());
                positions.push(index);
            }
            None => {
                debug!(label, "Column has no matching view field");
                unmatched_labels.push(label.to_string());
            }
        }
    }

    let mut matched_rows = Vec::with_capacity(rows.len() + 1);
    matched_rows.push(names);
    matched_rows.push(labels);
    for row in rows.iter().skip(1) {
        let projected = positions
            .iter()
            .map(|&index| row.get(index).cloned().unwrap_or_default())
            .collect();
        matched_rows.push(projected);
    }

    info!(
        matched = positions.len() - FIXED_COLUMNS.len(),
        unmatched = unmatched_labels.len(),
        rows = rows.len().saturating_sub(1),
        "Reconciled input columns with metadata view"
    );

    Reconciliation {
        matched_rows,
        unmatched_labels,
    }
}
