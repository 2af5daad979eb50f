use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SplitError>;

/// Fatal failures of a split run.
///
/// Sections whose start page lies past the end of the document are not errors;
/// they are reported by the plan as skipped and the run continues.
#[derive(Debug, Error)]
pub enum SplitError {
    #[error("cannot read source document {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("cannot write {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("invalid section #{index} ({name:?}): {reason}")]
    InvalidSection {
        index: usize,
        name: String,
        reason: String,
    },

    #[error("duplicate section name {name:?} at #{first} and #{second}")]
    DuplicateSection {
        name: String,
        first: usize,
        second: usize,
    },
}

impl SplitError {
    pub fn read(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        SplitError::Read {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn write(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        SplitError::Write {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
