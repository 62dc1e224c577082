use std::fs;
use std::path::{Path, PathBuf};

use cairn_crypto::ContentHasher;
use cairn_types::{Author, ObjectId};
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::index::{BlobEncoding, ContentIndex, IndexEntry};
use crate::log::ContentLog;

/// Receipt for bytes appended to the log but not yet indexed.
///
/// Hand it to [`ObjectStore::add_index`] to record the blob, or to
/// [`ObjectStore::discard`] to drop the bytes again.
#[must_use = "a staged blob must be passed to `add_index` or `discard`"]
#[derive(Debug, PartialEq, Eq)]
pub struct StagedBlob {
    start: u64,
    len: u64,
    encoding: BlobEncoding,
}

impl StagedBlob {
    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn encoding(&self) -> BlobEncoding {
        self.encoding
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Accumulating,
    Flushed,
    /// A `write` failed part way. Both handles are closed.
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlushOutcome {
    /// This call persisted the session.
    Written { blobs: usize, log_bytes: u64 },
    /// An earlier call already did; nothing was touched.
    AlreadyFlushed,
}

/// One append session against a store directory.
///
/// Blobs accumulate in memory as `add*` / `add_index` pairs and reach disk
/// together on [`write`](Self::write): log bytes first, then one index
/// generation describing them. Every log entry has exactly one index entry.
#[derive(Debug)]
pub struct ObjectStore {
    dir: PathBuf,
    config: StoreConfig,
    log: ContentLog,
    index: ContentIndex,
    /// `(start, len)` of the blob appended but not yet indexed.
    pending: Option<(u64, u64)>,
    state: SessionState,
}

impl ObjectStore {
    /// Open a session on `dir`, creating the directory and both files if
    /// missing.
    pub fn init(dir: impl AsRef<Path>, config: &StoreConfig, author: Author) -> StoreResult<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|source| StoreError::Open {
            path: dir.to_path_buf(),
            source,
        })?;
        let log = ContentLog::open(&config.log_path(dir))?;
        let index = ContentIndex::open(&config.index_path(dir), author)?;
        debug!(dir = %dir.display(), base_offset = log.base_offset(), "store session opened");
        Ok(Self {
            dir: dir.to_path_buf(),
            config: config.clone(),
            log,
            index,
            pending: None,
            state: SessionState::Accumulating,
        })
    }

    fn ensure_open(&self) -> StoreResult<()> {
        match self.state {
            SessionState::Accumulating => Ok(()),
            SessionState::Flushed => Err(StoreError::Flushed),
            SessionState::Failed => Err(StoreError::SessionFailed),
        }
    }

    fn stage(&mut self, bytes: &[u8], encoding: BlobEncoding) -> StoreResult<StagedBlob> {
        self.ensure_open()?;
        if let Some((start, len)) = self.pending {
            return Err(StoreError::UnindexedBlob { start, len });
        }
        let (start, len) = self.log.append(bytes)?;
        self.pending = Some((start, len));
        debug!(start, len, ?encoding, "staged blob");
        Ok(StagedBlob {
            start,
            len,
            encoding,
        })
    }

    /// Append a byte buffer to the log.
    pub fn add(&mut self, bytes: &[u8]) -> StoreResult<StagedBlob> {
        self.stage(bytes, BlobEncoding::Raw)
    }

    /// Append a regular file's contents to the log.
    pub fn add_file(&mut self, path: &Path) -> StoreResult<StagedBlob> {
        self.ensure_open()?;
        let data = read_regular_file(path)?;
        self.stage(&data, BlobEncoding::Raw)
    }

    /// Append a regular file's contents to the log, zstd-compressed.
    pub fn add_compressed_file(&mut self, path: &Path) -> StoreResult<StagedBlob> {
        self.ensure_open()?;
        let data = read_regular_file(path)?;
        let packed = zstd::bulk::compress(&data, self.config.compression_level)
            .map_err(|e| StoreError::Compression(format!("{}: {e}", path.display())))?;
        debug!(
            path = %path.display(),
            raw = data.len(),
            compressed = packed.len(),
            "compressed blob"
        );
        self.stage(&packed, BlobEncoding::Zstd)
    }

    fn take_pending(&mut self, staged: &StagedBlob) -> StoreResult<()> {
        match self.pending {
            Some((start, len)) if start == staged.start && len == staged.len => {
                self.pending = None;
                Ok(())
            }
            _ => Err(StoreError::StaleBlob {
                start: staged.start,
            }),
        }
    }

    /// Record the index entry for a staged blob.
    ///
    /// `hash` defaults to the digest of the stored bytes. A supplied hash is
    /// recorded as given, and `verify` will compare against it.
    pub fn add_index(
        &mut self,
        staged: StagedBlob,
        path: impl Into<String>,
        hash: Option<ObjectId>,
    ) -> StoreResult<&IndexEntry> {
        self.ensure_open()?;
        let hash = match hash {
            Some(h) => h,
            None => ContentHasher::BLOB.hash(self.log.buffered(staged.start, staged.len)?),
        };
        self.take_pending(&staged)?;

        let entry = IndexEntry {
            start: staged.start,
            len: staged.len,
            path: path.into(),
            hash,
            encoding: staged.encoding,
        };
        self.log.record_entry();
        let entry = self.index.push(entry)?;
        debug!(path = %entry.path, start = entry.start, len = entry.len, "indexed blob");
        Ok(entry)
    }

    /// Drop a staged blob's bytes from the log buffer.
    pub fn discard(&mut self, staged: StagedBlob) -> StoreResult<()> {
        self.ensure_open()?;
        self.take_pending(&staged)?;
        self.log.truncate_to(staged.start)
    }

    /// `add` then `add_index` under `path`.
    pub fn put(&mut self, path: impl Into<String>, bytes: &[u8]) -> StoreResult<&IndexEntry> {
        let staged = self.add(bytes)?;
        self.add_index(staged, path, None)
    }

    /// `add_file(file)` then `add_index` under `path`.
    pub fn put_file(&mut self, path: impl Into<String>, file: &Path) -> StoreResult<&IndexEntry> {
        let staged = self.add_file(file)?;
        self.add_index(staged, path, None)
    }

    /// `add_compressed_file(file)` then `add_index` under `path`.
    pub fn put_compressed_file(
        &mut self,
        path: impl Into<String>,
        file: &Path,
    ) -> StoreResult<&IndexEntry> {
        let staged = self.add_compressed_file(file)?;
        self.add_index(staged, path, None)
    }

    /// Persist the session: log bytes, then the index generation.
    ///
    /// Only the first call writes. Later calls return
    /// [`FlushOutcome::AlreadyFlushed`]. A session with no blobs closes its
    /// handles without writing a generation.
    pub fn write(&mut self) -> StoreResult<FlushOutcome> {
        match self.state {
            SessionState::Accumulating => {}
            SessionState::Flushed => {
                warn!(dir = %self.dir.display(), "store session already flushed; ignoring write");
                return Ok(FlushOutcome::AlreadyFlushed);
            }
            SessionState::Failed => return Err(StoreError::SessionFailed),
        }
        if let Some((start, len)) = self.pending {
            return Err(StoreError::UnindexedBlob { start, len });
        }

        match self.flush_both() {
            Ok(outcome) => {
                self.state = SessionState::Flushed;
                Ok(outcome)
            }
            Err(e) => {
                self.log.close();
                self.index.close();
                self.state = SessionState::Failed;
                Err(e)
            }
        }
    }

    fn flush_both(&mut self) -> StoreResult<FlushOutcome> {
        let blobs = self.index.len();
        if self.log.num_entries() != blobs {
            return Err(StoreError::Invariant(
                "content log and index disagree on entry count",
            ));
        }
        if blobs == 0 {
            self.log.close();
            self.index.close();
            debug!(dir = %self.dir.display(), "empty session; nothing written");
            return Ok(FlushOutcome::Written {
                blobs: 0,
                log_bytes: 0,
            });
        }

        // Everything that can fail without I/O happens before the log is touched.
        let generation = self.index.encode()?;
        let log_bytes = self.log.flush(self.config.sync_mode)?;
        self.index.flush(&generation, self.config.sync_mode)?;
        debug!(dir = %self.dir.display(), blobs, log_bytes, "store session flushed");
        Ok(FlushOutcome::Written { blobs, log_bytes })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn log(&self) -> &ContentLog {
        &self.log
    }

    pub fn index(&self) -> &ContentIndex {
        &self.index
    }

    /// Whether a blob is appended but not yet indexed.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl Drop for ObjectStore {
    fn drop(&mut self) {
        if self.state == SessionState::Accumulating && (!self.index.is_empty() || self.has_pending())
        {
            warn!(
                dir = %self.dir.display(),
                entries = self.index.len(),
                "store session dropped without write; buffered blobs are lost"
            );
        }
    }
}

fn read_regular_file(path: &Path) -> StoreResult<Vec<u8>> {
    let meta = fs::metadata(path).map_err(|source| StoreError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    if !meta.is_file() {
        let found = if meta.is_dir() {
            "directory"
        } else {
            "special file"
        };
        return Err(StoreError::NotARegularFile {
            path: path.to_path_buf(),
            found,
        });
    }
    fs::read(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}
