use std::path::Path;

use rust_xlsxwriter::{Format, Workbook};

use crate::error::{MergeError, Result};
use crate::io::excel_read::extension;
use crate::model::{CellValue, MergeResult};

const OUTPUT_SHEET: &str = "Merged";
const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Writes the template header row followed by every merged row.
///
/// A `.csv` path produces CSV; anything else produces an xlsx workbook.
/// Failures are reported as [`MergeError::OutputWrite`].
pub fn write_result(path: &Path, result: &MergeResult) -> Result<()> {
    let written = match extension(path).as_deref() {
        Some("csv") => write_csv(path, result),
        _ => write_workbook(path, result),
    };
    written.map_err(|err| MergeError::OutputWrite {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}

fn write_workbook(path: &Path, result: &MergeResult) -> Result<()> {
    let mut workbook = Workbook::new();
    let datetime = Format::new().set_num_format(DATETIME_FORMAT);

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(OUTPUT_SHEET)?;

    for (col_idx, header) in result.columns.iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, header)?;
    }

    for (row_idx, row) in result.rows.iter().enumerate() {
        let row_num = (row_idx + 1) as u32;
        for (col_idx, cell) in row.iter().enumerate() {
            let col_num = col_idx as u16;
            match cell {
                CellValue::Empty => {}
                CellValue::Text(value) => {
                    worksheet.write_string(row_num, col_num, value)?;
                }
                CellValue::Number(value) => {
                    worksheet.write_number(row_num, col_num, *value)?;
                }
                CellValue::DateTime(serial) => {
                    worksheet.write_number_with_format(row_num, col_num, *serial, &datetime)?;
                }
                CellValue::Bool(value) => {
                    worksheet.write_boolean(row_num, col_num, *value)?;
                }
            }
        }
    }

    if !result.columns.is_empty() {
        worksheet.set_freeze_panes(1, 0)?;
    }

    workbook.save(path)?;
    Ok(())
}

fn write_csv(path: &Path, result: &MergeResult) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&result.columns)?;
    for row in &result.rows {
        writer.write_record(row.iter().map(CellValue::to_string))?;
    }
    writer.flush()?;
    Ok(())
}
