//! User-visible run summaries

use core_sync::SyncOutcome;
use std::fmt;
use std::path::PathBuf;

/// Summary of an import run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub input: PathBuf,
    pub view_name: String,
    /// Input columns that are not part of the metadata view
    pub unmatched_labels: Vec<String>,
    /// Sub-collections that could not be listed during asset discovery
    pub failed_collections: Vec<(String, String)>,
    pub outcome: SyncOutcome,
}

impl ImportReport {
    /// Whether a run-level failure stopped the import before its last row
    pub fn is_aborted(&self) -> bool {
        self.outcome.is_aborted()
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.unmatched_labels.is_empty() {
            writeln!(
                f,
                "Some columns from the file provided have not been included in the upload, \
                 as they are not part of the metadata view provided."
            )?;
            writeln!(f, "Please see below for the headers of the columns not included:")?;
            for label in &self.unmatched_labels {
                writeln!(f, "  {}", label)?;
            }
            writeln!(f)?;
        }

        for (collection_id, reason) in &self.failed_collections {
            writeln!(f, "Collection {} was skipped: {}", collection_id, reason)?;
        }

        writeln!(f, "Amount of files to update: {}", self.outcome.attempted)?;
        write!(
            f,
            "Assets successfully updated: {} of {}",
            self.outcome.succeeded, self.outcome.attempted
        )?;

        if !self.outcome.failures.is_empty() {
            writeln!(f)?;
            write!(f, "Some assets failed to update:")?;
            for failure in &self.outcome.failures {
                write!(
                    f,
                    "\n  Row {}: Asset ID: {}, Title: {}, Original filename: {}\n    {}",
                    failure.row,
                    failure.asset_id,
                    failure.title,
                    failure.original_name,
                    failure.reason
                )?;
            }
        }

        if let Some(abort) = &self.outcome.aborted {
            write!(
                f,
                "\nImport stopped at row {}: {}\n{} remaining rows were not processed.",
                abort.row, abort.reason, abort.remaining
            )?;
        }

        Ok(())
    }
}

/// Summary of an export run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub path: PathBuf,
    pub collection_title: String,
    pub asset_count: usize,
    pub column_count: usize,
}

impl fmt::Display for ExportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Exported {} assets ({} columns) from collection {}\nFile successfully saved to {}",
            self.asset_count,
            self.column_count,
            self.collection_title,
            self.path.display()
        )
    }
}

/// Summary of either kind of run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReport {
    Import(ImportReport),
    Export(ExportReport),
}

impl RunReport {
    /// Whether the run stopped early; exports either finish or fail.
    pub fn is_aborted(&self) -> bool {
        match self {
            Self::Import(report) => report.is_aborted(),
            Self::Export(_) => false,
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Import(report) => report.fmt(f),
            Self::Export(report) => report.fmt(f),
        }
    }
}
