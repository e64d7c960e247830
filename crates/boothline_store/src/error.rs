//! Error types for the lead store

use std::io;
use thiserror::Error;

/// Lead store result type.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Lead store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Candidate or edited row failed required-field or consent checks.
    #[error("invalid lead: {}", fields.join(", "))]
    Validation { fields: Vec<String> },

    /// Referenced row id does not exist in the table.
    #[error("no lead with row id {0}")]
    NotFound(u64),

    /// The same row id appears more than once in an edited table.
    #[error("row id {0} appears more than once in the edited table")]
    DuplicateId(u64),

    /// Backing file unreadable: permissions, corrupt header, or corrupt row.
    /// The store never repairs a corrupt file in place.
    #[error("lead table unavailable: {0}")]
    Unavailable(String),

    /// IO error on the write path.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// CSV error on the write path.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl StoreError {
    /// Create an unavailable error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}
