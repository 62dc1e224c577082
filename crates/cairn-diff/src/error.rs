//! Error types for the diff crate.

use std::io;
use std::path::PathBuf;

/// Errors that can occur while computing a delta.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// A file specification cannot be tokenized (directory, device, ...).
    #[error("{}: {reason}", .path.display())]
    InvalidInput { path: PathBuf, reason: String },

    /// A file could not be opened or read.
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The alignment table could not be allocated.
    #[error("cannot allocate delta table of {rows}x{cols} cells")]
    TableAllocation { rows: usize, cols: usize },

    /// The files handed to a table do not match the size it was built for.
    #[error("delta table is {table_rows}x{table_cols} but input needs {rows}x{cols}")]
    DimensionMismatch {
        table_rows: usize,
        table_cols: usize,
        rows: usize,
        cols: usize,
    },

    /// Backtrace was attempted on a table that was never filled.
    #[error("delta table has not been filled")]
    TableNotFilled,

    /// Internal state that the public API can never produce.
    #[error("BUG: {0}")]
    Invariant(&'static str),
}

impl DiffError {
    /// Whether this error is a broken internal invariant. The binary halts on
    /// these instead of reporting them as ordinary failures.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Invariant(_))
    }
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
