//! Foundation types shared by the cairn crates.
//!
//! # Key Types
//!
//! - [`ObjectId`] -- 32-byte content digest of a stored blob
//! - [`Author`] -- who wrote an index generation, and when

pub mod author;
pub mod error;
pub mod object;

pub use author::Author;
pub use error::TypeError;
pub use object::{ObjectId, HASH_SIZE};
