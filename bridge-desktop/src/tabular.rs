//! Table Store Implementation (CSV via `csv`, workbooks via `calamine` / `rust_xlsxwriter`)

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    tabular::{TableFormat, TableStore},
};
use calamine::{open_workbook_auto, Data, Reader};
use quick_xml::events::Event;
use rust_xlsxwriter::Workbook;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

const UTF8_BOM: char = '\u{feff}';
const WORKBOOK_PART: &str = "xl/workbook.xml";

/// File-backed table store
///
/// The format is picked from the path extension. All file work runs on the
/// blocking thread pool.
#[derive(Debug, Clone, Default)]
pub struct FileTableStore;

impl FileTableStore {
    pub fn new() -> Self {
        Self
    }

    fn read_csv(path: &Path) -> Result<Vec<Vec<String>>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)
            .map_err(|e| table_error(path, e))?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| table_error(path, e))?;
            rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        if let Some(first) = rows.first_mut().and_then(|row| row.first_mut()) {
            if first.starts_with(UTF8_BOM) {
                *first = first.trim_start_matches(UTF8_BOM).to_string();
            }
        }

        Ok(rows)
    }

    /// Rows of the workbook's active sheet
    fn read_workbook(path: &Path) -> Result<Vec<Vec<String>>> {
        let mut workbook = open_workbook_auto(path).map_err(|e| table_error(path, e))?;
        let index = active_sheet_index(path).unwrap_or(0);
        debug!(path = %path.display(), sheet = index, "Reading worksheet");

        let range = workbook
            .worksheet_range_at(index)
            .ok_or_else(|| {
                BridgeError::Table(format!("{}: workbook has no sheet {}", path.display(), index))
            })?
            .map_err(|e| table_error(path, e))?;

        // Ranges start at the first used cell; re-anchor them at A1.
        let (row_offset, col_offset) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));

        let mut rows = vec![Vec::new(); row_offset];
        for row in range.rows() {
            let mut cells = vec![String::new(); col_offset];
            cells.extend(row.iter().map(cell_to_string));
            rows.push(cells);
        }

        Ok(rows)
    }

    fn write_csv(path: &Path, rows: &[&Vec<String>]) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|e| table_error(path, e))?;

        for row in rows {
            writer.write_record(row.iter()).map_err(|e| table_error(path, e))?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_workbook(path: &Path, rows: &[&Vec<String>]) -> Result<()> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                let (r, c) = (
                    u32::try_from(r).map_err(|e| table_error(path, e))?,
                    u16::try_from(c).map_err(|e| table_error(path, e))?,
                );
                worksheet
                    .write_string(r, c, cell)
                    .map_err(|e| table_error(path, e))?;
            }
        }

        workbook.save(path).map_err(|e| table_error(path, e))?;
        Ok(())
    }
}

/// `activeTab` of the first workbook view of an OOXML workbook.
///
/// `None` for files that are not zip packages (legacy `.xls`) and for
/// workbooks that do not record an active tab; both mean the first sheet.
fn active_sheet_index(path: &Path) -> Option<usize> {
    let mut archive = zip::ZipArchive::new(File::open(path).ok()?).ok()?;
    let mut xml = String::new();
    archive
        .by_name(WORKBOOK_PART)
        .ok()?
        .read_to_string(&mut xml)
        .ok()?;
    active_tab(&xml)
}

fn active_tab(workbook_xml: &str) -> Option<usize> {
    let mut reader = quick_xml::Reader::from_str(workbook_xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e))
                if e.local_name().as_ref() == b"workbookView" =>
            {
                return e
                    .attributes()
                    .flatten()
                    .find(|attr| attr.key.local_name().as_ref() == b"activeTab")
                    .and_then(|attr| attr.decode_and_unescape_value(&reader).ok()?.parse().ok());
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

fn table_error(path: &Path, error: impl std::fmt::Display) -> BridgeError {
    BridgeError::Table(format!("{}: {}", path.display(), error))
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => (*f as i64).to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

async fn run_blocking<T, F>(task: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| BridgeError::OperationFailed(format!("table task failed: {}", e)))?
}

#[async_trait]
impl TableStore for FileTableStore {
    async fn read_table(&self, path: &Path) -> Result<Vec<Vec<String>>> {
        let path: PathBuf = path.to_path_buf();
        let format = TableFormat::from_path(&path);
        debug!(path = %path.display(), ?format, "Reading table");

        run_blocking(move || match format {
            TableFormat::Csv => Self::read_csv(&path),
            TableFormat::Xlsx => Self::read_workbook(&path),
        })
        .await
    }

    async fn write_table(
        &self,
        path: &Path,
        header_rows: &[Vec<String>],
        data_rows: &[Vec<String>],
    ) -> Result<()> {
        let path: PathBuf = path.to_path_buf();
        let format = TableFormat::from_path(&path);
        let rows: Vec<Vec<String>> = header_rows.iter().chain(data_rows).cloned().collect();
        debug!(path = %path.display(), ?format, rows = rows.len(), "Writing table");

        run_blocking(move || {
            let rows: Vec<&Vec<String>> = rows.iter().collect();
            match format {
                TableFormat::Csv => Self::write_csv(&path, &rows),
                TableFormat::Xlsx => Self::write_workbook(&path, &rows),
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[tokio::test]
    async fn test_csv_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.csv");
        let store = FileTableStore::new();

        let header = vec![row(&["id", "original_name", "size", "title", "Content Categories"])];
        let data = vec![row(&["a1", "clip.mov", "1024", "My, Clip", "Promotional,Internal"])];
        store.write_table(&path, &header, &data).await.unwrap();

        let rows = store.read_table(&path).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], header[0]);
        assert_eq!(rows[1][3], "My, Clip");
        assert_eq!(rows[1][4], "Promotional,Internal");
    }

    #[tokio::test]
    async fn test_csv_bom_and_ragged_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("input.csv");
        std::fs::write(&path, "\u{feff}id,original_name,size,title\nx,y\n").unwrap();

        let rows = FileTableStore::new().read_table(&path).await.unwrap();
        assert_eq!(rows[0][0], "id");
        assert_eq!(rows[1], row(&["x", "y"]));
    }

    #[tokio::test]
    async fn test_xlsx_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.xlsx");
        let store = FileTableStore::new();

        let header = vec![row(&["id", "original_name", "size", "title"])];
        let data = vec![
            row(&["a1", "clip.mov", "1024", "First"]),
            row(&["a2", "N/A", "N/A", "Second"]),
        ];
        store.write_table(&path, &header, &data).await.unwrap();

        let rows = store.read_table(&path).await.unwrap();
        assert_eq!(rows, vec![header[0].clone(), data[0].clone(), data[1].clone()]);
    }

    #[tokio::test]
    async fn test_xlsx_reads_active_sheet() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("delivery.xlsx");

        let mut workbook = Workbook::new();
        workbook
            .add_worksheet()
            .set_name("Notes")
            .unwrap()
            .write_string(0, 0, "scratch")
            .unwrap();
        let data = workbook.add_worksheet().set_name("Data").unwrap();
        data.set_active(true);
        for (c, cell) in ["id", "original_name", "size", "title"].iter().enumerate() {
            data.write_string(0, c as u16, *cell).unwrap();
        }
        data.write_string(1, 1, "clip.mov").unwrap();
        workbook.save(&path).unwrap();

        let rows = FileTableStore::new().read_table(&path).await.unwrap();

        assert_eq!(rows[0], row(&["id", "original_name", "size", "title"]));
        assert_eq!(rows[1], row(&["", "clip.mov", "", ""]));
        assert_eq!(active_sheet_index(&path), Some(1));
    }

    #[test]
    fn test_active_tab_from_workbook_part() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <bookViews><workbookView xWindow="240" yWindow="15" activeTab="2"/></bookViews>
  <sheets><sheet name="A" sheetId="1"/><sheet name="B" sheetId="2"/><sheet name="C" sheetId="3"/></sheets>
</workbook>"#;
        assert_eq!(active_tab(xml), Some(2));
        assert_eq!(active_tab("<workbook><bookViews><workbookView/></bookViews></workbook>"), None);
    }

    #[tokio::test]
    async fn test_missing_file_is_table_error() {
        let dir = TempDir::new().unwrap();
        let error = FileTableStore::new()
            .read_table(&dir.path().join("missing.csv"))
            .await
            .unwrap_err();

        assert!(matches!(error, BridgeError::Table(_)));
    }

    #[test]
    fn test_cell_conversion() {
        assert_eq!(cell_to_string(&Data::Float(1024.0)), "1024");
        assert_eq!(cell_to_string(&Data::Float(29.97)), "29.97");
        assert_eq!(cell_to_string(&Data::Bool(true)), "true");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }
}
