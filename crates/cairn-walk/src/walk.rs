//! Recursive enumeration of regular files under a root.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{WalkError, WalkResult};

/// List every regular file under `root`, relative to it.
///
/// Entries are visited in file-name order within each directory, so the
/// result is stable across runs. Symlinks are not followed.
pub fn walk_files(root: impl AsRef<Path>) -> WalkResult<Vec<PathBuf>> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(WalkError::NotADirectory(root.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(root)
            .map_err(|_| WalkError::Invariant("walkdir yielded a path outside its root"))?;
        files.push(rel.to_path_buf());
    }
    Ok(files)
}
