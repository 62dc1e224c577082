//! Single-level directory cursor.
//!
//! A [`DirCursor`] walks the entries of one directory. Descending or
//! ascending produces a new cursor, so a caller can hold several levels at
//! once and nothing is shared between them.

use std::ffi::OsString;
use std::fs::{self, ReadDir};
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{WalkError, WalkResult};

/// Classification of a directory entry, following symlinks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryType {
    Folder,
    File,
    Unknown,
}

/// The entry a cursor currently points at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntryInfo {
    pub name: OsString,
    pub path: PathBuf,
    pub kind: EntryType,
}

/// Cursor over the entries of one directory.
#[derive(Debug)]
pub struct DirCursor {
    path: PathBuf,
    /// `None` once every entry has been visited.
    entries: Option<ReadDir>,
    current: Option<DirEntryInfo>,
}

impl DirCursor {
    /// Open a cursor on `path`, which must be a directory.
    pub fn open(path: impl AsRef<Path>) -> WalkResult<Self> {
        let path = path.as_ref();
        match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => {}
            _ => return Err(WalkError::NotADirectory(path.to_path_buf())),
        }
        let entries = fs::read_dir(path).map_err(|source| WalkError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "opened directory cursor");
        Ok(Self {
            path: path.to_path_buf(),
            entries: Some(entries),
            current: None,
        })
    }

    /// Directory this cursor walks.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Advance to the next entry.
    ///
    /// `Ok(Some(_))` selects a new entry, `Ok(None)` means the directory is
    /// exhausted (and stays exhausted), `Err` reports a failed read or stat.
    /// `.` and `..` are never yielded.
    pub fn next_entry(&mut self) -> WalkResult<Option<&DirEntryInfo>> {
        let Some(entries) = self.entries.as_mut() else {
            return Ok(None);
        };

        loop {
            let dirent = match entries.next() {
                Some(Ok(d)) => d,
                Some(Err(source)) => {
                    return Err(WalkError::Io {
                        path: self.path.clone(),
                        source,
                    })
                }
                None => {
                    self.entries = None;
                    self.current = None;
                    return Ok(None);
                }
            };

            let name = dirent.file_name();
            if name == "." || name == ".." {
                continue;
            }

            let path = dirent.path();
            // stat, not lstat: a link to a folder counts as a folder.
            let meta = fs::metadata(&path).map_err(|source| WalkError::Stat {
                path: path.clone(),
                source,
            })?;
            let kind = if meta.is_dir() {
                EntryType::Folder
            } else if meta.is_file() {
                EntryType::File
            } else {
                EntryType::Unknown
            };

            self.current = Some(DirEntryInfo { name, path, kind });
            return Ok(self.current.as_ref());
        }
    }

    /// The currently selected entry, if any.
    pub fn current(&self) -> Option<&DirEntryInfo> {
        self.current.as_ref()
    }

    pub fn entry_type(&self) -> Option<EntryType> {
        self.current.as_ref().map(|e| e.kind)
    }

    /// Open a cursor on the currently selected entry.
    ///
    /// Calling this before [`next_entry`](Self::next_entry) has selected
    /// anything is a contract violation and yields [`WalkError::Invariant`].
    pub fn child(&self) -> WalkResult<DirCursor> {
        let entry = self
            .current
            .as_ref()
            .ok_or(WalkError::Invariant("directory cursor has no current entry"))?;
        if entry.kind != EntryType::Folder {
            return Err(WalkError::NotAFolder {
                parent: self.path.clone(),
                name: entry.name.to_string_lossy().into_owned(),
            });
        }
        DirCursor::open(&entry.path)
    }

    /// Open a cursor on the parent directory.
    pub fn parent(&self) -> WalkResult<DirCursor> {
        let ends_in_dot = matches!(
            self.path.components().next_back(),
            None | Some(Component::CurDir) | Some(Component::ParentDir)
        );
        let parent = match self.path.parent() {
            Some(p) if !ends_in_dot && !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => self.path.join(".."),
        };
        DirCursor::open(parent)
    }

    /// Create a folder named `name` inside this directory.
    pub fn make_folder(&self, name: &str) -> WalkResult<PathBuf> {
        let mut components = Path::new(name).components();
        let single = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single {
            return Err(WalkError::InvalidName(name.to_string()));
        }

        let target = self.path.join(name);
        fs::create_dir(&target).map_err(|source| WalkError::MakeFolder {
            path: target.clone(),
            source,
        })?;
        debug!(path = %target.display(), "created folder");
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        fs::write(dir.path().join("b.txt"), b"b").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("c.txt"), b"c").unwrap();
        dir
    }

    fn drain(cursor: &mut DirCursor) -> Vec<DirEntryInfo> {
        let mut out = Vec::new();
        while let Some(entry) = cursor.next_entry().unwrap() {
            out.push(entry.clone());
        }
        out
    }

    #[test]
    fn open_rejects_file() {
        let dir = fixture();
        let err = DirCursor::open(dir.path().join("a.txt")).unwrap_err();
        assert!(matches!(err, WalkError::NotADirectory(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn open_rejects_missing() {
        let dir = fixture();
        let err = DirCursor::open(dir.path().join("nope")).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn yields_each_entry_once_with_types() {
        let dir = fixture();
        let mut cursor = DirCursor::open(dir.path()).unwrap();
        let entries = drain(&mut cursor);

        let names: BTreeSet<_> = entries
            .iter()
            .map(|e| e.name.to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries.len(), 3);
        assert_eq!(
            names,
            ["a.txt", "b.txt", "sub"].iter().map(|s| s.to_string()).collect()
        );
        assert!(!names.contains(".") && !names.contains(".."));

        for entry in &entries {
            let expected = if entry.name == "sub" {
                EntryType::Folder
            } else {
                EntryType::File
            };
            assert_eq!(entry.kind, expected);
        }
    }

    #[test]
    fn exhausted_cursor_stays_exhausted() {
        let dir = tempfile::tempdir().unwrap();
        let mut cursor = DirCursor::open(dir.path()).unwrap();
        assert!(cursor.next_entry().unwrap().is_none());
        assert!(cursor.next_entry().unwrap().is_none());
        assert!(cursor.current().is_none());
    }

    #[test]
    fn child_before_selection_is_invariant_violation() {
        let dir = fixture();
        let cursor = DirCursor::open(dir.path()).unwrap();
        let err = cursor.child().unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().starts_with("BUG:"));
    }

    #[test]
    fn child_on_file_is_rejected() {
        let dir = fixture();
        let mut cursor = DirCursor::open(dir.path()).unwrap();
        loop {
            let entry = cursor.next_entry().unwrap().unwrap();
            if entry.kind == EntryType::File {
                break;
            }
        }
        let err = cursor.child().unwrap_err();
        assert!(matches!(err, WalkError::NotAFolder { .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn descend_and_return() {
        let dir = fixture();
        let mut cursor = DirCursor::open(dir.path()).unwrap();
        while cursor.entry_type() != Some(EntryType::Folder) {
            cursor.next_entry().unwrap().unwrap();
        }

        let mut child = cursor.child().unwrap();
        let inner = drain(&mut child);
        assert_eq!(inner.len(), 1);
        assert_eq!(inner[0].name, "c.txt");

        let parent = child.parent().unwrap();
        assert_eq!(
            fs::canonicalize(parent.path()).unwrap(),
            fs::canonicalize(dir.path()).unwrap()
        );
    }

    #[test]
    fn parent_of_dot_path_goes_up() {
        let dir = fixture();
        let cursor = DirCursor::open(dir.path().join("sub").join(".")).unwrap();
        let parent = cursor.parent().unwrap();
        assert_eq!(
            fs::canonicalize(parent.path()).unwrap(),
            fs::canonicalize(dir.path()).unwrap()
        );
    }

    #[test]
    fn make_folder_creates_child() {
        let dir = fixture();
        let cursor = DirCursor::open(dir.path()).unwrap();
        let made = cursor.make_folder("fresh").unwrap();
        assert!(made.is_dir());

        let err = cursor.make_folder("fresh").unwrap_err();
        assert!(matches!(err, WalkError::MakeFolder { .. }));
    }

    #[test]
    fn make_folder_rejects_nested_names() {
        let dir = fixture();
        let cursor = DirCursor::open(dir.path()).unwrap();
        for bad in ["", "a/b", "..", "/abs"] {
            let err = cursor.make_folder(bad).unwrap_err();
            assert!(matches!(err, WalkError::InvalidName(_)), "{bad:?}");
        }
    }
}
