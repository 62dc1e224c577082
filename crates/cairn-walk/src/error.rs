//! Error types for the walk crate.

use std::io;
use std::path::PathBuf;

/// Errors that can occur while traversing a directory tree.
#[derive(Debug, thiserror::Error)]
pub enum WalkError {
    /// The root passed to a cursor is not a directory.
    #[error("{}: not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// Tried to descend into an entry that is not a folder.
    #[error("{}: {name}: not a directory", .parent.display())]
    NotAFolder { parent: PathBuf, name: String },

    /// `stat` on an entry failed.
    #[error("{}: can't do stat: {source}", .path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading a directory failed.
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Creating a child folder failed.
    #[error("{}: can't make a folder: {source}", .path.display())]
    MakeFolder {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Folder names must be a single, non-empty path component.
    #[error("invalid folder name: {0:?}")]
    InvalidName(String),

    /// Recursive walk failed.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// A cursor operation was called on state it can never legally be in.
    #[error("BUG: {0}")]
    Invariant(&'static str),
}

impl WalkError {
    /// Whether this error means the caller broke a contract rather than the
    /// environment misbehaving. The binary halts on these.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Invariant(_))
    }
}

/// Convenience alias for walk results.
pub type WalkResult<T> = Result<T, WalkError>;
