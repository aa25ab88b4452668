//! Error types for the data-loader crate.
//!
//! Two kinds of failure live here:
//! - file-level problems (missing file, unreadable CSV) that stop a load
//!   before it starts
//! - cell-level problems (`MalformedCell`) that only disqualify one row

use crate::types::Column;
use thiserror::Error;

/// Errors that can occur while reading rows or decoding their cells
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The CSV reader rejected a record (bad quoting, wrong field count, ...)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A multi-valued cell is not a list literal
    ///
    /// Carries enough context to find the offending row in the source file.
    #[error("Malformed {column} cell in row {row} ({title:?}): {reason}")]
    MalformedCell {
        row: usize,
        title: String,
        column: Column,
        reason: String,
    },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
