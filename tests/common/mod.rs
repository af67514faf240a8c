#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::Workbook;
use sheet_merge::io::excel_read;
use sheet_merge::model::CellValue;
use tempfile::{TempDir, tempdir};

/// Scratch directory holding the fixture files of one test case.
pub struct Workspace {
    temp_dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temporary directory"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Writes a single-sheet workbook. Cells that parse as numbers are
    /// written as numbers, empty strings are left blank.
    pub fn xlsx(&self, name: &str, rows: &[&[&str]]) -> PathBuf {
        let path = self.join(name);
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        for (row_idx, row) in rows.iter().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                let (r, c) = (row_idx as u32, col_idx as u16);
                if cell.is_empty() {
                    continue;
                }
                match cell.parse::<f64>() {
                    Ok(number) => worksheet.write_number(r, c, number).expect("number cell"),
                    Err(_) => worksheet.write_string(r, c, *cell).expect("string cell"),
                };
            }
        }
        workbook.save(&path).expect("fixture workbook saved");
        path
    }

    pub fn csv(&self, name: &str, rows: &[&[&str]]) -> PathBuf {
        let path = self.join(name);
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(&path)
            .expect("csv fixture opened");
        for row in rows {
            writer.write_record(*row).expect("csv row written");
        }
        writer.flush().expect("csv fixture flushed");
        path
    }

    pub fn raw(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.join(name);
        fs::write(&path, contents).expect("raw fixture written");
        path
    }
}

/// Reads a written output back as display strings.
pub fn read_table(path: &Path) -> Vec<Vec<String>> {
    excel_read::read_grid(path)
        .expect("output readable")
        .into_iter()
        .map(|row| row.iter().map(CellValue::to_string).collect())
        .collect()
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

pub fn text_row(values: &[&str]) -> Vec<CellValue> {
    values.iter().map(|value| CellValue::text(*value)).collect()
}
