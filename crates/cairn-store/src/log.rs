//! The content log: blobs concatenated in append order.
//!
//! On-disk format is the bare bytes of every blob, back to back, with no
//! header or padding. Only the index knows where one blob ends and the next
//! begins. Offsets are absolute across sessions: a session opened on an
//! existing log starts appending at its current end.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::SyncMode;
use crate::error::{StoreError, StoreResult};

/// One session's view of the content log.
#[derive(Debug)]
pub struct ContentLog {
    path: PathBuf,
    /// Open until the session flushes or fails.
    file: Option<File>,
    /// Log length when the session opened; offset of the first buffered byte.
    base_offset: u64,
    num_entries: usize,
    /// Bytes appended during this session, not yet on disk.
    buf: Vec<u8>,
    flushed: bool,
}

impl ContentLog {
    /// Open (or create) the log at `path` for appending.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| StoreError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        let base_offset = file
            .metadata()
            .map_err(|source| StoreError::Open {
                path: path.to_path_buf(),
                source,
            })?
            .len();

        debug!(path = %path.display(), base_offset, "opened content log");
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            base_offset,
            num_entries: 0,
            buf: Vec::new(),
            flushed: false,
        })
    }

    /// Absolute offset the next appended byte will land at.
    pub fn offset(&self) -> u64 {
        self.base_offset + self.buf.len() as u64
    }

    pub fn base_offset(&self) -> u64 {
        self.base_offset
    }

    /// Blobs recorded in this session.
    pub fn num_entries(&self) -> usize {
        self.num_entries
    }

    /// Bytes waiting for `flush`.
    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_flushed(&self) -> bool {
        self.flushed
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `bytes` to the accumulation buffer. Returns `(start, len)`.
    pub(crate) fn append(&mut self, bytes: &[u8]) -> StoreResult<(u64, u64)> {
        if self.flushed {
            return Err(StoreError::Flushed);
        }
        self.buf
            .try_reserve(bytes.len())
            .map_err(|_| StoreError::OutOfMemory {
                requested: bytes.len(),
            })?;
        let start = self.offset();
        self.buf.extend_from_slice(bytes);
        Ok((start, bytes.len() as u64))
    }

    /// Buffered bytes of an append made in this session.
    pub(crate) fn buffered(&self, start: u64, len: u64) -> StoreResult<&[u8]> {
        let from = start
            .checked_sub(self.base_offset)
            .ok_or(StoreError::StaleBlob { start })? as usize;
        let to = from + len as usize;
        self.buf
            .get(from..to)
            .ok_or(StoreError::StaleBlob { start })
    }

    /// Drop every buffered byte from `start` on.
    pub(crate) fn truncate_to(&mut self, start: u64) -> StoreResult<()> {
        let keep = start
            .checked_sub(self.base_offset)
            .ok_or(StoreError::StaleBlob { start })? as usize;
        if keep > self.buf.len() {
            return Err(StoreError::StaleBlob { start });
        }
        self.buf.truncate(keep);
        Ok(())
    }

    pub(crate) fn record_entry(&mut self) {
        self.num_entries += 1;
    }

    /// Write the buffer to disk and close the handle.
    ///
    /// The handle is dropped on every path out of this function, so it is
    /// closed exactly once whether or not the write succeeds.
    pub(crate) fn flush(&mut self, sync: SyncMode) -> StoreResult<u64> {
        let mut file = self
            .file
            .take()
            .ok_or(StoreError::Invariant("content log flushed without an open handle"))?;
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        let actual = file.metadata().map_err(io_err)?.len();
        if actual != self.base_offset {
            return Err(StoreError::LogMoved {
                expected: self.base_offset,
                actual,
            });
        }

        file.write_all(&self.buf).map_err(io_err)?;
        file.flush().map_err(io_err)?;
        if sync == SyncMode::EveryWrite {
            file.sync_all().map_err(io_err)?;
        }

        let written = self.buf.len() as u64;
        self.base_offset += written;
        self.buf = Vec::new();
        self.flushed = true;
        debug!(path = %self.path.display(), written, entries = self.num_entries, "flushed content log");
        Ok(written)
    }

    /// Close the handle without writing.
    pub(crate) fn close(&mut self) {
        self.file = None;
    }
}
