//! The content index: where each blob lives in the log and what it hashes to.
//!
//! Every flushed session appends one *generation* to the index file. All
//! integers are big-endian:
//!
//! ```text
//! "CIDX" | version u32
//! name_len u16 | name | email_len u16 | email | timestamp_ms i64
//! count u32
//! count × { start u64 | len u64 | encoding u8 | path_len u32 | path | hash [32] }
//! crc32 u32 over everything above
//! ```

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use cairn_types::{Author, ObjectId, HASH_SIZE};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::SyncMode;
use crate::error::{StoreError, StoreResult};

pub const INDEX_MAGIC: &[u8; 4] = b"CIDX";
pub const INDEX_VERSION: u32 = 1;

/// How a blob's bytes sit in the log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum BlobEncoding {
    Raw = 0,
    Zstd = 1,
}

impl BlobEncoding {
    fn from_u8(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::Raw),
            1 => Some(Self::Zstd),
            _ => None,
        }
    }
}

/// One blob in the log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    /// Absolute byte offset of the blob in the log.
    pub start: u64,
    /// Stored length in bytes (compressed length for zstd blobs).
    pub len: u64,
    pub path: String,
    /// Digest of the stored bytes.
    pub hash: ObjectId,
    pub encoding: BlobEncoding,
}

impl IndexEntry {
    /// Offset one past the blob's last byte.
    pub fn end(&self) -> u64 {
        self.start + self.len
    }
}

/// The entries one session flushed, with who flushed them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Generation {
    pub author: Author,
    pub entries: Vec<IndexEntry>,
}

/// One session's view of the index file.
#[derive(Debug)]
pub struct ContentIndex {
    path: PathBuf,
    file: Option<File>,
    author: Author,
    entries: Vec<IndexEntry>,
    flushed: bool,
}

impl ContentIndex {
    /// Open (or create) the index at `path` for appending.
    pub fn open(path: &Path, author: Author) -> StoreResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| StoreError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(path = %path.display(), "opened content index");
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            author,
            entries: Vec::new(),
            flushed: false,
        })
    }

    pub(crate) fn push(&mut self, entry: IndexEntry) -> StoreResult<&IndexEntry> {
        if self.flushed {
            return Err(StoreError::Flushed);
        }
        self.entries.push(entry);
        self.entries
            .last()
            .ok_or(StoreError::Invariant("index entry vanished after push"))
    }

    /// Entries recorded in this session, in append order.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    pub fn is_flushed(&self) -> bool {
        self.flushed
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// This session's generation, ready for [`flush`](Self::flush).
    pub fn encode(&self) -> StoreResult<Vec<u8>> {
        encode_generation(&self.author, &self.entries)
    }

    /// Append an encoded generation and close the handle.
    pub(crate) fn flush(&mut self, bytes: &[u8], sync: SyncMode) -> StoreResult<u64> {
        let mut file = self
            .file
            .take()
            .ok_or(StoreError::Invariant("content index flushed without an open handle"))?;

        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        file.write_all(bytes).map_err(io_err)?;
        file.flush().map_err(io_err)?;
        if sync == SyncMode::EveryWrite {
            file.sync_all().map_err(io_err)?;
        }

        self.flushed = true;
        debug!(
            path = %self.path.display(),
            entries = self.entries.len(),
            bytes = bytes.len(),
            "appended index generation"
        );
        Ok(bytes.len() as u64)
    }

    pub(crate) fn close(&mut self) {
        self.file = None;
    }
}

fn put_str_u16(buf: &mut Vec<u8>, field: &'static str, s: &str) -> StoreResult<()> {
    let len = u16::try_from(s.len()).map_err(|_| StoreError::FieldTooLong {
        field,
        len: s.len(),
    })?;
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(s.as_bytes());
    Ok(())
}

/// Serialize one generation, checksum included.
pub fn encode_generation(author: &Author, entries: &[IndexEntry]) -> StoreResult<Vec<u8>> {
    let mut buf = Vec::new();
    buf.extend_from_slice(INDEX_MAGIC);
    buf.extend_from_slice(&INDEX_VERSION.to_be_bytes());

    put_str_u16(&mut buf, "author name", &author.name)?;
    put_str_u16(&mut buf, "author email", &author.email)?;
    buf.extend_from_slice(&author.timestamp_ms().to_be_bytes());

    let count = u32::try_from(entries.len()).map_err(|_| StoreError::FieldTooLong {
        field: "entry count",
        len: entries.len(),
    })?;
    buf.extend_from_slice(&count.to_be_bytes());

    for entry in entries {
        buf.extend_from_slice(&entry.start.to_be_bytes());
        buf.extend_from_slice(&entry.len.to_be_bytes());
        buf.push(entry.encoding as u8);
        let path_len = u32::try_from(entry.path.len()).map_err(|_| StoreError::FieldTooLong {
            field: "path",
            len: entry.path.len(),
        })?;
        buf.extend_from_slice(&path_len.to_be_bytes());
        buf.extend_from_slice(entry.path.as_bytes());
        buf.extend_from_slice(entry.hash.as_bytes());
    }

    let crc = crc32fast::hash(&buf);
    buf.extend_from_slice(&crc.to_be_bytes());
    Ok(buf)
}

/// Reads fixed-width fields off the front of the index bytes.
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn corrupted(&self, reason: impl Into<String>) -> StoreError {
        StoreError::IndexCorrupted {
            offset: self.pos as u64,
            reason: reason.into(),
        }
    }

    fn take(&mut self, n: usize, what: &str) -> StoreResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| self.corrupted(format!("truncated {what}")))?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self, what: &str) -> StoreResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, what)?);
        Ok(out)
    }

    fn u8(&mut self, what: &str) -> StoreResult<u8> {
        Ok(self.array::<1>(what)?[0])
    }

    fn u16(&mut self, what: &str) -> StoreResult<u16> {
        self.array(what).map(u16::from_be_bytes)
    }

    fn u32(&mut self, what: &str) -> StoreResult<u32> {
        self.array(what).map(u32::from_be_bytes)
    }

    fn u64(&mut self, what: &str) -> StoreResult<u64> {
        self.array(what).map(u64::from_be_bytes)
    }

    fn i64(&mut self, what: &str) -> StoreResult<i64> {
        self.array(what).map(i64::from_be_bytes)
    }

    fn string(&mut self, len: usize, what: &str) -> StoreResult<String> {
        let start = self.pos;
        let bytes = self.take(len, what)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| StoreError::IndexCorrupted {
            offset: start as u64,
            reason: format!("{what} is not valid UTF-8"),
        })
    }
}

fn decode_one(cur: &mut Cursor<'_>) -> StoreResult<Generation> {
    let begin = cur.pos;

    let magic = cur.array::<4>("magic")?;
    if &magic != INDEX_MAGIC {
        return Err(StoreError::IndexCorrupted {
            offset: begin as u64,
            reason: format!("bad magic {:?}", String::from_utf8_lossy(&magic)),
        });
    }
    let version = cur.u32("version")?;
    if version != INDEX_VERSION {
        return Err(StoreError::UnsupportedVersion(version));
    }

    let name_len = cur.u16("author name length")? as usize;
    let name = cur.string(name_len, "author name")?;
    let email_len = cur.u16("author email length")? as usize;
    let email = cur.string(email_len, "author email")?;
    let timestamp_ms = cur.i64("timestamp")?;
    let author = Author::from_parts(name, email, timestamp_ms)?;

    let count = cur.u32("entry count")? as usize;
    // Each entry takes at least 53 bytes; don't trust a count the data can't hold.
    let mut entries = Vec::with_capacity(count.min(cur.data.len() / 53));
    for _ in 0..count {
        let start = cur.u64("entry start")?;
        let len = cur.u64("entry length")?;
        let enc_pos = cur.pos;
        let encoding = BlobEncoding::from_u8(cur.u8("encoding")?).ok_or_else(|| {
            StoreError::IndexCorrupted {
                offset: enc_pos as u64,
                reason: "unknown blob encoding".into(),
            }
        })?;
        let path_len = cur.u32("path length")? as usize;
        let path = cur.string(path_len, "path")?;
        let hash = ObjectId::from_hash(cur.array::<HASH_SIZE>("hash")?);
        entries.push(IndexEntry {
            start,
            len,
            path,
            hash,
            encoding,
        });
    }

    let body_end = cur.pos;
    let stored = cur.u32("checksum")?;
    let computed = crc32fast::hash(&cur.data[begin..body_end]);
    if stored != computed {
        return Err(StoreError::IndexCorrupted {
            offset: body_end as u64,
            reason: format!("checksum mismatch: stored {stored:08x}, computed {computed:08x}"),
        });
    }

    Ok(Generation { author, entries })
}

/// Parse every generation in an index file's bytes, oldest first.
pub fn decode_generations(data: &[u8]) -> StoreResult<Vec<Generation>> {
    let mut cur = Cursor { data, pos: 0 };
    let mut generations = Vec::new();
    while cur.pos < data.len() {
        let generation = decode_one(&mut cur).inspect_err(|e| {
            warn!(generation = generations.len(), error = %e, "unreadable index generation");
        })?;
        generations.push(generation);
    }
    Ok(generations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn author() -> Author {
        Author::from_parts("ada", "ada@example.com", 1_700_000_000_123).unwrap()
    }

    fn entry(start: u64, len: u64, path: &str) -> IndexEntry {
        IndexEntry {
            start,
            len,
            path: path.into(),
            hash: ObjectId::from_hash([start as u8; 32]),
            encoding: BlobEncoding::Raw,
        }
    }

    #[test]
    fn generation_encodes_and_decodes() {
        let entries = vec![entry(0, 5, "a.txt"), entry(5, 6, "dir/b.txt")];
        let bytes = encode_generation(&author(), &entries).unwrap();
        assert_eq!(&bytes[..4], INDEX_MAGIC);

        let gens = decode_generations(&bytes).unwrap();
        assert_eq!(gens.len(), 1);
        assert_eq!(gens[0].author, author());
        assert_eq!(gens[0].entries, entries);
    }

    #[test]
    fn empty_input_has_no_generations() {
        assert!(decode_generations(&[]).unwrap().is_empty());
    }

    #[test]
    fn generations_concatenate() {
        let mut bytes = encode_generation(&author(), &[entry(0, 3, "x")]).unwrap();
        bytes.extend(encode_generation(&author(), &[entry(3, 4, "y"), entry(7, 1, "z")]).unwrap());
        let gens = decode_generations(&bytes).unwrap();
        assert_eq!(gens.len(), 2);
        assert_eq!(gens[1].entries[0].start, 3);
        assert_eq!(gens[1].entries.len(), 2);
    }

    #[test]
    fn flipped_byte_fails_checksum() {
        let mut bytes = encode_generation(&author(), &[entry(0, 5, "a.txt")]).unwrap();
        let mid = bytes.len() / 2;
        bytes[mid] ^= 0xff;
        assert!(matches!(
            decode_generations(&bytes),
            Err(StoreError::IndexCorrupted { .. })
        ));
    }

    #[test]
    fn truncated_generation_is_reported() {
        let bytes = encode_generation(&author(), &[entry(0, 5, "a.txt")]).unwrap();
        let err = decode_generations(&bytes[..bytes.len() - 3]).unwrap_err();
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn bad_magic_and_version() {
        let mut bytes = encode_generation(&author(), &[]).unwrap();
        bytes[0] = b'X';
        assert!(matches!(
            decode_generations(&bytes),
            Err(StoreError::IndexCorrupted { offset: 0, .. })
        ));

        let mut bytes = encode_generation(&author(), &[]).unwrap();
        bytes[4..8].copy_from_slice(&9u32.to_be_bytes());
        assert!(matches!(
            decode_generations(&bytes),
            Err(StoreError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn overlong_author_rejected() {
        let long = Author::from_parts("n".repeat(70_000), "e", 0).unwrap();
        assert!(matches!(
            encode_generation(&long, &[]),
            Err(StoreError::FieldTooLong { field: "author name", .. })
        ));
    }

    #[test]
    fn flush_appends_generation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("idx");
        let mut index = ContentIndex::open(&path, author()).unwrap();
        index.push(entry(0, 5, "a")).unwrap();
        assert_eq!(index.len(), 1);
        let bytes = index.encode().unwrap();
        assert_eq!(index.flush(&bytes, SyncMode::EveryWrite).unwrap(), bytes.len() as u64);
        assert!(index.is_flushed());
        assert!(matches!(index.push(entry(5, 1, "b")), Err(StoreError::Flushed)));

        let gens = decode_generations(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(gens[0].entries, vec![entry(0, 5, "a")]);
    }
}
