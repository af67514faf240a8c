use crate::error::MergeError;
use crate::model::ColumnResolution;

/// Decision for one resolved source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted { matched: usize },
    Rejected { matched: usize, required: usize },
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted { .. })
    }

    /// Converts a rejection into the error recorded in the run summary.
    pub fn into_result(self) -> Result<usize, MergeError> {
        match self {
            Verdict::Accepted { matched } => Ok(matched),
            Verdict::Rejected { matched, required } => {
                Err(MergeError::InsufficientMatch { matched, required })
            }
        }
    }
}

/// Accepts the resolution when at least `min_matches` template columns
/// were resolved.
pub fn accept(resolution: &ColumnResolution, min_matches: usize) -> Verdict {
    let matched = resolution.matched_count();
    if matched >= min_matches {
        Verdict::Accepted { matched }
    } else {
        Verdict::Rejected {
            matched,
            required: min_matches,
        }
    }
}
