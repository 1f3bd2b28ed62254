//! Tabular formatter for exports
//!
//! Renders assets against a metadata view: the fixed columns, then one
//! column per view field in view order.

use crate::reconcile::FIXED_COLUMNS;
use bridge_traits::catalog::{join_cells, Asset, MetadataView};
use bridge_traits::tabular::TableFormat;
use chrono::{DateTime, TimeZone};
use std::fmt::Display;

/// Placeholder for file columns of an asset without files
pub const NOT_AVAILABLE: &str = "N/A";

/// Formatted export: two header rows plus one row per asset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabularExport {
    pub header_names: Vec<String>,
    pub header_labels: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TabularExport {
    /// Header rows written to the output file.
    ///
    /// Only the label row is written, so the file can be imported again
    /// as-is.
    pub fn header_rows(&self) -> Vec<Vec<String>> {
        vec![self.header_labels.clone()]
    }
}

pub fn format_assets(view: &MetadataView, assets: &[Asset]) -> TabularExport {
    let fixed = FIXED_COLUMNS.iter().map(|c| c.to_string());
    let header_names = fixed
        .clone()
        .chain(view.data_fields().map(|f| f.name.clone()))
        .collect();
    let header_labels = fixed
        .chain(view.data_fields().map(|f| f.label.clone()))
        .collect();

    let rows = assets
        .iter()
        .map(|asset| {
            let (name, size) = match asset.first_file() {
                Some(file) => (file.original_name.clone(), file.size.to_string()),
                None => (NOT_AVAILABLE.to_string(), NOT_AVAILABLE.to_string()),
            };

            let mut row = vec![asset.id.clone(), name, size, asset.title.clone()];
            row.extend(view.data_fields().map(|field| {
                asset
                    .metadata
                    .get(&field.name)
                    .map(|values| join_cells(values))
                    .unwrap_or_default()
            }));
            row
        })
        .collect();

    TabularExport {
        header_names,
        header_labels,
        rows,
    }
}

/// `{collection_id}_{title}_Report_{YYYY-MM-DD_HHMMSS}.{csv|xlsx}`
pub fn report_file_name<Tz>(
    collection_id: &str,
    collection_title: &str,
    timestamp: &DateTime<Tz>,
    format: TableFormat,
) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let title: String = collection_title
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();

    format!(
        "{}_{}_Report_{}.{}",
        collection_id,
        title,
        timestamp.format("%Y-%m-%d_%H%M%S"),
        format.extension()
    )
}
