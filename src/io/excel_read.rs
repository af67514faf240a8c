use std::path::Path;

use calamine::{DataType, Reader, open_workbook_auto};

use crate::error::{MergeError, Result};
use crate::model::CellValue;

/// Extensions read natively through calamine.
pub const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "xla", "ods"];

/// Lower-case extension of `path`, if any.
pub fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// Reads the first worksheet of a workbook, or a CSV file, as a grid of cells.
///
/// Rows keep their original order; no header interpretation happens here.
pub fn read_grid(path: &Path) -> Result<Vec<Vec<CellValue>>> {
    match extension(path).as_deref() {
        Some("csv") => read_csv_grid(path),
        Some(ext) if WORKBOOK_EXTENSIONS.contains(&ext) => read_workbook_grid(path),
        _ => Err(MergeError::UnsupportedFormat(path.to_path_buf())),
    }
}

fn read_workbook_grid(path: &Path) -> Result<Vec<Vec<CellValue>>> {
    let mut workbook = open_workbook_auto(path)?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range?,
        None => return Ok(Vec::new()),
    };

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_value).collect())
        .collect())
}

fn read_csv_grid(path: &Path) -> Result<Vec<Vec<CellValue>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record?;
        grid.push(record.iter().map(CellValue::text).collect());
    }
    Ok(grid)
}

fn cell_value(cell: &DataType) -> CellValue {
    match cell {
        DataType::String(value) => CellValue::text(value.clone()),
        DataType::Float(value) => CellValue::Number(*value),
        DataType::Int(value) => CellValue::Number(*value as f64),
        DataType::Bool(value) => CellValue::Bool(*value),
        DataType::DateTime(serial) => CellValue::DateTime(*serial),
        DataType::Empty => CellValue::Empty,
        other => CellValue::text(other.to_string()),
    }
}

/// Text of a header cell. Numeric headers keep their shortest form.
pub fn header_text(cell: &CellValue) -> String {
    cell.to_string().trim().to_string()
}
