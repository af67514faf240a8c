use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A single spreadsheet cell as it travels from a source file to the output.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum CellValue {
    /// Blank cell.
    #[default]
    Empty,
    /// Text literal.
    Text(String),
    /// Numeric literal.
    Number(f64),
    /// Date or time stored as an Excel serial number.
    DateTime(f64),
    /// Boolean literal.
    Bool(bool),
}

impl CellValue {
    /// Builds a text cell, mapping the empty string to [`CellValue::Empty`].
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value)
        }
    }

    /// Returns true when the cell carries no visible content.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(value) => value.trim().is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(value) => f.write_str(value),
            CellValue::Number(value) | CellValue::DateTime(value) => write!(f, "{value}"),
            CellValue::Bool(value) => write!(f, "{value}"),
        }
    }
}

/// Ordered column names read from the template's header row.
///
/// The schema defines the column order and count of the merged output and is
/// never mutated once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSchema {
    columns: Vec<String>,
}

impl TemplateSchema {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// One loaded input file: its raw header row and the data rows beneath it.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

/// Template column index → source column index for one source file.
///
/// `None` marks a template column that no source column was resolved to. A
/// source index appears at most once across all slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnResolution {
    slots: Vec<Option<usize>>,
}

impl ColumnResolution {
    pub(crate) fn from_slots(slots: Vec<Option<usize>>) -> Self {
        Self { slots }
    }

    pub fn slots(&self) -> &[Option<usize>] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Source column index resolved for the template column at `index`.
    pub fn get(&self, index: usize) -> Option<usize> {
        self.slots.get(index).copied().flatten()
    }

    /// Number of template columns that were resolved.
    pub fn matched_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Template column indices left unresolved.
    pub fn unresolved(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.is_none().then_some(idx))
    }
}

/// Why a source file was left out of the merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RejectionKind {
    LoadFailed,
    ConversionFailed,
    InsufficientMatch,
}

/// Result of processing one source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum OutcomeStatus {
    Accepted {
        matched: usize,
        rows: usize,
        /// Template columns filled with the empty value for this file.
        missing: Vec<String>,
    },
    Rejected {
        kind: RejectionKind,
        reason: String,
    },
}

/// Per-file entry of the run summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

impl FileOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self.status, OutcomeStatus::Accepted { .. })
    }
}

/// Merged rows aligned to the template plus the outcome of every input file.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
    pub outcomes: Vec<FileOutcome>,
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub accepted: usize,
    pub rejected: usize,
    pub rows: usize,
}

impl MergeResult {
    pub fn summary(&self) -> RunSummary {
        let accepted = self.outcomes.iter().filter(|o| o.is_accepted()).count();
        RunSummary {
            accepted,
            rejected: self.outcomes.len() - accepted,
            rows: self.rows.len(),
        }
    }
}
