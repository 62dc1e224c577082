//! Append-only object storage for cairn.
//!
//! A store directory holds two files. The *content log* is every blob's bytes
//! concatenated with no framing. The *content index* says where each blob
//! starts, how long it is, which path it came from and what it hashes to.
//! Both only ever grow.
//!
//! # Sessions
//!
//! An [`ObjectStore`] is one append session. Blobs are staged with
//! [`ObjectStore::add`] (or `add_file` / `add_compressed_file`), recorded with
//! [`ObjectStore::add_index`], and reach disk together on
//! [`ObjectStore::write`], which appends the log bytes and then one index
//! *generation*. A session writes at most once.
//!
//! [`StoreReader`] reads every generation back and checks the log against it.
//!
//! # Design Rules
//!
//! 1. Every log entry has exactly one index entry.
//! 2. Offsets are absolute across sessions.
//! 3. Hashes cover the bytes as stored, compressed or not.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod config;
pub mod error;
pub mod index;
pub mod log;
pub mod object;
pub mod reader;

pub use config::{StoreConfig, SyncMode};
pub use error::{StoreError, StoreResult};
pub use index::{
    decode_generations, encode_generation, BlobEncoding, ContentIndex, Generation, IndexEntry,
};
pub use log::ContentLog;
pub use object::{FlushOutcome, ObjectStore, SessionState, StagedBlob};
pub use reader::{StoreReader, VerifyIssue, VerifyReport};
