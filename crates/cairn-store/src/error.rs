use std::path::PathBuf;

use cairn_types::{ObjectId, TypeError};

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A log, index or input file could not be opened or stat'ed.
    #[error("cannot open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A path handed to `add_file` is not a regular file.
    #[error("{}: expected a regular file, found {found}", .path.display())]
    NotARegularFile { path: PathBuf, found: &'static str },

    /// Reading or writing an open store file failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The accumulation buffer could not grow.
    #[error("out of memory growing the content buffer by {requested} bytes")]
    OutOfMemory { requested: usize },

    #[error("compression failed: {0}")]
    Compression(String),

    #[error("decompression failed for {path}: {reason}")]
    Decompression { path: String, reason: String },

    /// A blob was appended and a second append arrived before it was indexed.
    #[error("blob at offset {start} ({len} bytes) was appended but never indexed")]
    UnindexedBlob { start: u64, len: u64 },

    /// The staged blob handed to `add_index` is not the pending append.
    #[error("staged blob at offset {start} does not match the pending append")]
    StaleBlob { start: u64 },

    /// The session has been flushed; appends need a new session.
    #[error("store session already flushed; open a new session to append")]
    Flushed,

    /// A previous `write` failed part way; the session is closed.
    #[error("store session failed during write; open a new session")]
    SessionFailed,

    /// Someone else appended to the log while this session was open.
    #[error("content log moved under this session: expected {expected} bytes, found {actual}")]
    LogMoved { expected: u64, actual: u64 },

    /// A string does not fit its length prefix in the index format.
    #[error("{field} is too long for the index format ({len} bytes)")]
    FieldTooLong { field: &'static str, len: usize },

    /// The index file cannot be decoded.
    #[error("index corrupted at offset {offset}: {reason}")]
    IndexCorrupted { offset: u64, reason: String },

    #[error("unsupported index version: {0}")]
    UnsupportedVersion(u32),

    /// An index entry points past the end of the log.
    #[error("{path}: range {start}+{len} exceeds log length {log_len}")]
    OutOfBounds {
        path: String,
        start: u64,
        len: u64,
        log_len: u64,
    },

    /// Log bytes that no index entry covers.
    #[error("log range {start}+{len} is not covered by any index entry")]
    UnindexedRange { start: u64, len: u64 },

    /// An index entry starts inside the previous entry's range.
    #[error("{path}: range at {start} overlaps the previous blob ending at {prev_end}")]
    Overlap { path: String, start: u64, prev_end: u64 },

    /// Stored bytes no longer hash to the recorded digest.
    #[error("{path}: hash mismatch, index has {expected}, content hashes to {computed}")]
    HashMismatch {
        path: String,
        expected: ObjectId,
        computed: ObjectId,
    },

    #[error(transparent)]
    Type(#[from] TypeError),

    /// Log and index disagree in a way no sequence of API calls can cause.
    #[error("BUG: {0}")]
    Invariant(&'static str),
}

impl StoreError {
    /// Whether this error is a broken internal invariant. The binary halts on
    /// these.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Invariant(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
