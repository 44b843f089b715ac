//! Workbook-backed data source.
//!
//! Every sheet of the source workbook carries a fixed-size block of
//! descriptive text above the real header row, plus one separator row
//! between the header and the first data row. Normalization strips that
//! scaffolding, cleans the column names and tags every column with an
//! inferred [`crate::model::ColumnType`]; metadata extraction pulls the
//! text block itself.
//!
//! The workbook is a read-only resource: each call re-parses the requested
//! sheet, so no state is shared between requests.

use std::path::{Path, PathBuf};

use calamine::{Data, Range, Reader, open_workbook_auto};

use crate::error::{DataSourceError, SourceResult};
use crate::model::{DataTable, Value};
use crate::source::{DataLevel, DataSource, MetadataBlock};

/// Number of descriptive text rows preceding the header row in every sheet.
pub const METADATA_ROWS: usize = 3;

/// Offset from the header row to the first data row. The single row in
/// between is a separator and is skipped unconditionally, blank or not.
const HEADER_TO_DATA_GAP: usize = 2;

/// Data source that reads directly from the workbook sheets.
#[derive(Debug)]
pub struct ExcelDataSource {
    path: PathBuf,
}

impl ExcelDataSource {
    /// Open a workbook-backed source.
    ///
    /// The workbook is opened once to verify it is reachable; each data or
    /// metadata call re-opens and re-parses it.
    pub fn open(path: impl AsRef<Path>) -> SourceResult<Self> {
        let path = path.as_ref().to_path_buf();
        open_workbook_auto(&path).map_err(|e| {
            DataSourceError::backend(format!("cannot open workbook {}: {e}", path.display()))
        })?;
        Ok(Self { path })
    }

    /// The normalized (unfiltered) table behind `table`, all levels included.
    ///
    /// This is the entry point the ingestion pipeline uses to read a clean
    /// table per sheet.
    pub fn normalized_table(&self, table: &str) -> SourceResult<DataTable> {
        let range = self
            .sheet_range(table)
            .map_err(|cause| DataSourceError::data_not_found(format!("table '{table}': {cause}")))?;
        normalize_sheet(&range)
            .map_err(|cause| DataSourceError::data_not_found(format!("table '{table}': {cause}")))
    }

    fn sheet_range(&self, table: &str) -> Result<Range<Data>, String> {
        let mut workbook = open_workbook_auto(&self.path).map_err(|e| e.to_string())?;
        workbook
            .worksheet_range(table)
            .map_err(|e| format!("sheet not readable: {e}"))
    }
}

impl DataSource for ExcelDataSource {
    fn get_data(&self, table: &str, level: DataLevel) -> SourceResult<DataTable> {
        let data = self.normalized_table(table)?;

        let column = level.column_name();
        if data.index_of(column).is_none() {
            return Err(DataSourceError::data_not_found(format!(
                "table '{table}' has no '{column}' column"
            )));
        }

        let filtered = data.filter_equals(column, level.as_str());
        if filtered.is_empty() {
            return Err(DataSourceError::data_not_found(format!(
                "no data found for table '{table}' with data level {}",
                level.as_str()
            )));
        }
        Ok(filtered)
    }

    fn get_metadata(&self, table: &str) -> SourceResult<MetadataBlock> {
        let range = self.sheet_range(table).map_err(|cause| {
            DataSourceError::metadata_not_found(format!("table '{table}': {cause}"))
        })?;
        extract_metadata(&range, table)
    }
}

/// Strip the metadata block and separator row from a raw sheet and assign
/// clean column names, producing a typed [`DataTable`].
///
/// The row at index [`METADATA_ROWS`] is the header; numeric header cells are
/// coerced to integer form, discarding formatting artifacts such as the
/// trailing decimal zero on year labels ("1992.0" → "1992"). Data rows start
/// [`HEADER_TO_DATA_GAP`] rows after the header.
fn normalize_sheet(range: &Range<Data>) -> Result<DataTable, String> {
    let rows: Vec<&[Data]> = range.rows().collect();

    let header = rows
        .get(METADATA_ROWS)
        .ok_or_else(|| format!("sheet has no header row at index {METADATA_ROWS}"))?;
    let names: Vec<String> = header.iter().map(header_cell_name).collect();
    if names.iter().all(|n| n.is_empty()) {
        return Err("header row is blank".to_string());
    }

    let data_rows: Vec<Vec<Value>> = rows
        .iter()
        .skip(METADATA_ROWS + HEADER_TO_DATA_GAP)
        .map(|row| {
            (0..names.len())
                .map(|i| cell_to_value(row.get(i).unwrap_or(&Data::Empty)))
                .collect()
        })
        .collect();

    Ok(DataTable::with_inferred_types(names, data_rows))
}

/// Extract the metadata block of `table` from its raw (header-less) sheet.
///
/// Reads exactly the first [`METADATA_ROWS`] rows of column 0, coerced to
/// text. Fails when the resulting block is empty.
fn extract_metadata(range: &Range<Data>, table: &str) -> SourceResult<MetadataBlock> {
    let lines: Vec<String> = range
        .rows()
        .take(METADATA_ROWS)
        .map(|row| row.first().map(cell_to_text).unwrap_or_default())
        .collect();

    if lines.iter().all(|line| line.trim().is_empty()) {
        return Err(DataSourceError::metadata_not_found(format!(
            "no metadata found for table '{table}'"
        )));
    }
    Ok(lines)
}

/// Header cells keep their text, but numeric cells become their integer form
/// so year labels read "1992" rather than "1992.0".
fn header_cell_name(c: &Data) -> String {
    match c {
        Data::Int(i) => i.to_string(),
        Data::Float(f) => ((*f) as i64).to_string(),
        other => cell_to_text(other).trim().to_string(),
    }
}

fn cell_to_text(c: &Data) -> String {
    match c {
        Data::String(s) => s.clone(),
        Data::Empty => String::new(),
        Data::Error(e) => format!("{e:?}"),
        other => other.to_string(),
    }
}

fn cell_to_value(c: &Data) -> Value {
    match c {
        Data::Empty => Value::Null,
        Data::Int(i) => Value::Integer(*i),
        Data::Float(f) => Value::Float(*f),
        Data::String(s) => Value::Text(s.clone()),
        other => Value::Text(cell_to_text(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::header_cell_name;
    use calamine::Data;

    #[test]
    fn year_headers_lose_their_trailing_decimal_zero() {
        assert_eq!(header_cell_name(&Data::Float(1992.0)), "1992");
        assert_eq!(header_cell_name(&Data::Int(2021)), "2021");
    }

    #[test]
    fn non_integer_numeric_headers_truncate_to_integer_form() {
        assert_eq!(header_cell_name(&Data::Float(1.5)), "1");
    }

    #[test]
    fn text_headers_are_trimmed_but_otherwise_untouched() {
        assert_eq!(
            header_cell_name(&Data::String(" Lfd. Nr. ".to_string())),
            "Lfd. Nr."
        );
    }
}
