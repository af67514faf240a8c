//! Accumulation of projected rows into the merged table.

pub mod project;

use std::path::PathBuf;

use crate::error::MergeError;
use crate::model::{CellValue, FileOutcome, MergeResult, OutcomeStatus, TemplateSchema};

pub use project::{project, project_rows};

/// Collects accepted rows in file order, then row order, together with the
/// outcome of every processed file.
#[derive(Debug)]
pub struct MergeAccumulator {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
    outcomes: Vec<FileOutcome>,
}

impl MergeAccumulator {
    pub fn new(schema: &TemplateSchema) -> Self {
        Self {
            columns: schema.columns().to_vec(),
            rows: Vec::new(),
            outcomes: Vec::new(),
        }
    }

    /// Appends the projected rows of an accepted file.
    pub fn append(&mut self, path: PathBuf, matched: usize, missing: Vec<String>, rows: Vec<Vec<CellValue>>) {
        self.outcomes.push(FileOutcome {
            path,
            status: OutcomeStatus::Accepted {
                matched,
                rows: rows.len(),
                missing,
            },
        });
        self.rows.extend(rows);
    }

    /// Records a file that contributed no rows.
    pub fn reject(&mut self, path: PathBuf, error: &MergeError) {
        self.outcomes.push(FileOutcome {
            path,
            status: OutcomeStatus::Rejected {
                kind: error.rejection_kind(),
                reason: error.to_string(),
            },
        });
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn finish(self) -> MergeResult {
        MergeResult {
            columns: self.columns,
            rows: self.rows,
            outcomes: self.outcomes,
        }
    }
}
