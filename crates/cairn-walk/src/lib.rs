//! Directory traversal for cairn.
//!
//! Supplies file paths to the object store and the delta engine. Neither of
//! them depends on traversal order beyond "each entry of a directory is
//! yielded exactly once".
//!
//! # Key Types
//!
//! - [`DirCursor`] -- one-level cursor with explicit descend/ascend
//! - [`EntryType`] -- folder / regular file / other
//! - [`walk_files`] -- sorted recursive listing of regular files

pub mod cursor;
pub mod error;
pub mod walk;

pub use cursor::{DirCursor, DirEntryInfo, EntryType};
pub use error::{WalkError, WalkResult};
pub use walk::walk_files;
