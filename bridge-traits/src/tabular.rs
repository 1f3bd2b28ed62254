//! Tabular File Abstraction
//!
//! Reads and writes spreadsheet-shaped data (CSV or Excel workbooks) as
//! plain rows of string cells.

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;

/// On-disk table format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableFormat {
    #[default]
    Csv,
    Xlsx,
}

impl TableFormat {
    /// Infer the format from a file extension; anything unknown is CSV.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("xlsx") | Some("xlsm") | Some("xls") => Self::Xlsx,
            _ => Self::Csv,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }
}

/// Table reader/writer trait
///
/// # Example
///
/// ```ignore
/// use bridge_traits::tabular::TableStore;
///
/// async fn header(store: &dyn TableStore, path: &Path) -> Result<Vec<String>> {
///     let rows = store.read_table(path).await?;
///     Ok(rows.into_iter().next().unwrap_or_default())
/// }
/// ```
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Read every row of the table at `path`. For workbooks the first
    /// worksheet is read.
    async fn read_table(&self, path: &Path) -> Result<Vec<Vec<String>>>;

    /// Write `header_rows` followed by `data_rows` to `path`, replacing any
    /// existing file.
    async fn write_table(
        &self,
        path: &Path,
        header_rows: &[Vec<String>],
        data_rows: &[Vec<String>],
    ) -> Result<()>;
}
