//! Read-only access to a flushed store directory.

use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use cairn_crypto::ContentHasher;
use cairn_types::ObjectId;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::index::{decode_generations, BlobEncoding, Generation, IndexEntry};

/// A problem `verify` found with one blob.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VerifyIssue {
    pub path: String,
    pub start: u64,
    pub len: u64,
    pub problem: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    pub blobs_checked: usize,
    pub bytes_checked: u64,
    pub issues: Vec<VerifyIssue>,
}

impl VerifyReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Every generation of a store's index, plus random access into its log.
#[derive(Debug)]
pub struct StoreReader {
    log_path: PathBuf,
    log: File,
    log_len: u64,
    generations: Vec<Generation>,
}

impl StoreReader {
    /// Open the store in `dir`. The whole index is parsed up front; a
    /// corrupted generation fails the open.
    pub fn open(dir: impl AsRef<Path>, config: &StoreConfig) -> StoreResult<Self> {
        let dir = dir.as_ref();
        let index_path = config.index_path(dir);
        let index_bytes = fs::read(&index_path).map_err(|source| StoreError::Open {
            path: index_path.clone(),
            source,
        })?;
        let generations = decode_generations(&index_bytes)?;

        let log_path = config.log_path(dir);
        let open_err = |source| StoreError::Open {
            path: log_path.clone(),
            source,
        };
        let log = File::open(&log_path).map_err(open_err)?;
        let log_len = log.metadata().map_err(open_err)?.len();

        debug!(
            dir = %dir.display(),
            generations = generations.len(),
            log_len,
            "opened store for reading"
        );
        Ok(Self {
            log_path,
            log,
            log_len,
            generations,
        })
    }

    pub fn generations(&self) -> &[Generation] {
        &self.generations
    }

    /// All entries, oldest generation first.
    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> + '_ {
        self.generations.iter().flat_map(|g| g.entries.iter())
    }

    pub fn log_len(&self) -> u64 {
        self.log_len
    }

    /// The bytes exactly as they sit in the log.
    pub fn read_stored(&self, entry: &IndexEntry) -> StoreResult<Vec<u8>> {
        let in_bounds = entry
            .start
            .checked_add(entry.len)
            .is_some_and(|end| end <= self.log_len);
        if !in_bounds {
            return Err(StoreError::OutOfBounds {
                path: entry.path.clone(),
                start: entry.start,
                len: entry.len,
                log_len: self.log_len,
            });
        }

        let io_err = |source| StoreError::Io {
            path: self.log_path.clone(),
            source,
        };
        let len = usize::try_from(entry.len).map_err(|_| StoreError::OutOfMemory {
            requested: usize::MAX,
        })?;
        let mut buf = Vec::new();
        buf.try_reserve_exact(len)
            .map_err(|_| StoreError::OutOfMemory { requested: len })?;
        buf.resize(len, 0);

        let mut log = &self.log;
        log.seek(SeekFrom::Start(entry.start)).map_err(io_err)?;
        log.read_exact(&mut buf).map_err(io_err)?;
        Ok(buf)
    }

    /// The blob's original content, decompressed if needed.
    pub fn read_content(&self, entry: &IndexEntry) -> StoreResult<Vec<u8>> {
        let stored = self.read_stored(entry)?;
        match entry.encoding {
            BlobEncoding::Raw => Ok(stored),
            BlobEncoding::Zstd => {
                zstd::stream::decode_all(&stored[..]).map_err(|e| StoreError::Decompression {
                    path: entry.path.clone(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Latest entry stored under `path`.
    pub fn get(&self, path: &str) -> Option<&IndexEntry> {
        self.entries().filter(|e| e.path == path).last()
    }

    /// First entry whose stored bytes hash to `hash`.
    pub fn get_by_hash(&self, hash: &ObjectId) -> Option<&IndexEntry> {
        self.entries().find(|e| &e.hash == hash)
    }

    /// Re-read and re-hash every blob, and check that the entries tile the
    /// log with no gaps, overlaps or trailing bytes.
    pub fn verify(&self) -> StoreResult<VerifyReport> {
        let mut report = VerifyReport::default();
        for entry in self.entries() {
            report.blobs_checked += 1;
            let problem = match self.read_stored(entry) {
                Ok(bytes) => {
                    report.bytes_checked += entry.len;
                    let computed = ContentHasher::BLOB.hash(&bytes);
                    if computed == entry.hash {
                        continue;
                    }
                    StoreError::HashMismatch {
                        path: entry.path.clone(),
                        expected: entry.hash,
                        computed,
                    }
                }
                Err(e @ StoreError::OutOfBounds { .. }) => e,
                Err(e) => return Err(e),
            };
            warn!(path = %entry.path, start = entry.start, error = %problem, "blob failed verification");
            report.issues.push(VerifyIssue {
                path: entry.path.clone(),
                start: entry.start,
                len: entry.len,
                problem: problem.to_string(),
            });
        }
        self.check_tiling(&mut report);
        Ok(report)
    }

    fn check_tiling(&self, report: &mut VerifyReport) {
        let mut spans: Vec<&IndexEntry> = self.entries().collect();
        spans.sort_by_key(|e| e.start);

        let mut covered = 0u64;
        let mut issues = Vec::new();
        for entry in spans {
            if entry.start > covered {
                issues.push(StoreError::UnindexedRange {
                    start: covered,
                    len: entry.start - covered,
                });
            } else if entry.start < covered {
                issues.push(StoreError::Overlap {
                    path: entry.path.clone(),
                    start: entry.start,
                    prev_end: covered,
                });
            }
            covered = covered.max(entry.start.saturating_add(entry.len));
        }
        if self.log_len > covered {
            issues.push(StoreError::UnindexedRange {
                start: covered,
                len: self.log_len - covered,
            });
        }

        for problem in issues {
            let (path, start, len) = match &problem {
                StoreError::UnindexedRange { start, len } => (String::new(), *start, *len),
                StoreError::Overlap {
                    path,
                    start,
                    prev_end,
                } => (path.clone(), *start, prev_end - start),
                _ => continue,
            };
            warn!(start, len, error = %problem, "log layout failed verification");
            report.issues.push(VerifyIssue {
                path,
                start,
                len,
                problem: problem.to_string(),
            });
        }
    }
}
