use std::path::PathBuf;

use thiserror::Error;

use crate::model::RejectionKind;
use crate::pipeline::MergeReport;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, MergeError>;

/// Error type covering the failures that can occur while loading the template,
/// resolving source headers, or writing the merged output.
#[derive(Debug, Error)]
pub enum MergeError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the CSV reader or writer.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the spreadsheet reader implementation.
    #[error("spreadsheet read error: {0}")]
    ExcelRead(#[from] calamine::Error),

    /// The template, mapping, or configuration file could not be used.
    #[error("configuration error in {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    /// Raised when a configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A source file could not be opened or parsed.
    #[error("failed to load {}: {reason}", path.display())]
    FileLoad { path: PathBuf, reason: String },

    /// Legacy-format conversion failed or timed out.
    #[error("conversion failed for {}: {reason}", path.display())]
    Conversion { path: PathBuf, reason: String },

    /// The resolved mapping did not reach the acceptance threshold.
    #[error("{matched} of {required} minimum columns matched")]
    InsufficientMatch { matched: usize, required: usize },

    /// The merged output could not be persisted.
    #[error("failed to write output {}: {reason}", path.display())]
    OutputWrite { path: PathBuf, reason: String },

    /// No source file was accepted and the run is configured to abort.
    #[error("no source file matched the template; nothing to merge")]
    NothingMerged,

    /// Every source was processed but no output was written. The merged rows
    /// and per-file outcomes stay available in `report`.
    #[error("{source}")]
    Unwritten {
        report: Box<MergeReport>,
        source: Box<MergeError>,
    },

    /// The file extension is neither readable nor convertible.
    #[error("unsupported file type: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl MergeError {
    /// Classifies an error raised while handling a single source file.
    pub fn rejection_kind(&self) -> RejectionKind {
        match self {
            MergeError::Conversion { .. } => RejectionKind::ConversionFailed,
            MergeError::InsufficientMatch { .. } => RejectionKind::InsufficientMatch,
            _ => RejectionKind::LoadFailed,
        }
    }

    /// Keeps a finished run's `report` alongside the error that stopped its output.
    pub(crate) fn unwritten(report: MergeReport, source: MergeError) -> Self {
        MergeError::Unwritten {
            report: Box::new(report),
            source: Box::new(source),
        }
    }

    /// Wraps any error as a load failure for `path`.
    pub(crate) fn file_load(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        MergeError::FileLoad {
            path: path.into(),
            reason: err.to_string(),
        }
    }

    /// Wraps any error as a fatal configuration failure for `path`.
    pub(crate) fn config(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        MergeError::Config {
            path: path.into(),
            reason: err.to_string(),
        }
    }
}
