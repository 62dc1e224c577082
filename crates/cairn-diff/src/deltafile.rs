//! Line tokenization of files for the delta engine.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{DiffError, DiffResult};

/// Line delimiter.
pub const DELIM: u8 = b'\n';

/// Names a file taking part in a delta.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileSpec {
    pub path: PathBuf,
    /// Name printed by the renderers.
    pub label: String,
}

impl FileSpec {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let label = path.display().to_string();
        Self { path, label }
    }

    pub fn with_label(path: impl Into<PathBuf>, label: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            label: label.into(),
        }
    }
}

/// A file split into comparable line units.
///
/// Lines exclude the delimiter. A trailing delimiter does not start an extra
/// empty line, so `"a\nb\n"` and `"a\nb"` both tokenize to `["a", "b"]`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeltaFile {
    lines: Vec<String>,
}

impl DeltaFile {
    pub fn from_bytes(data: &[u8]) -> Self {
        let body = data.strip_suffix(&[DELIM]).unwrap_or(data);
        if data.is_empty() {
            return Self::default();
        }
        let lines = body
            .split(|&b| b == DELIM)
            .map(|line| String::from_utf8_lossy(line).into_owned())
            .collect();
        Self { lines }
    }

    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Read and tokenize the file named by `spec`.
    ///
    /// Directories and other non-regular files are rejected before any read.
    pub fn load(spec: &FileSpec) -> DiffResult<Self> {
        let path: &Path = &spec.path;
        let meta = fs::metadata(path).map_err(|source| DiffError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if meta.is_dir() {
            return Err(DiffError::InvalidInput {
                path: path.to_path_buf(),
                reason: "is a directory".into(),
            });
        }
        if !meta.is_file() {
            return Err(DiffError::InvalidInput {
                path: path.to_path_buf(),
                reason: "not a regular file".into(),
            });
        }
        let data = fs::read(path).map_err(|source| DiffError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_bytes(&data))
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, i: usize) -> Option<&str> {
        self.lines.get(i).map(String::as_str)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_delimiter_is_not_a_line() {
        assert_eq!(DeltaFile::from_bytes(b"a\nb\n").lines(), ["a", "b"]);
        assert_eq!(DeltaFile::from_bytes(b"a\nb").lines(), ["a", "b"]);
    }

    #[test]
    fn empty_input_has_no_lines() {
        assert!(DeltaFile::from_bytes(b"").is_empty());
    }

    #[test]
    fn blank_lines_are_kept() {
        assert_eq!(DeltaFile::from_bytes(b"\n").lines(), [""]);
        assert_eq!(DeltaFile::from_bytes(b"a\n\nb\n").lines(), ["a", "", "b"]);
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let file = DeltaFile::from_bytes(&[b'o', b'k', DELIM, 0xFF, 0xFE]);
        assert_eq!(file.len(), 2);
        assert_eq!(file.line(0), Some("ok"));
        assert!(file.line(1).unwrap().contains('\u{FFFD}'));
        assert_eq!(file.line(2), None);
    }

    #[test]
    fn load_reads_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.txt");
        fs::write(&path, b"one\ntwo\n").unwrap();
        let file = DeltaFile::load(&FileSpec::new(&path)).unwrap();
        assert_eq!(file.lines(), ["one", "two"]);
    }

    #[test]
    fn load_rejects_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = DeltaFile::load(&FileSpec::new(dir.path())).unwrap_err();
        assert!(matches!(err, DiffError::InvalidInput { .. }));
        assert!(err.to_string().contains("is a directory"));
    }

    #[test]
    fn load_reports_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        let err = DeltaFile::load(&FileSpec::new(&missing)).unwrap_err();
        assert!(matches!(err, DiffError::Io { .. }));
        assert!(err.to_string().contains("missing.txt"));
    }

    #[test]
    fn label_defaults_to_path() {
        let spec = FileSpec::new("dir/file.txt");
        assert_eq!(spec.label, "dir/file.txt");
        let spec = FileSpec::with_label("x", "a/x");
        assert_eq!(spec.label, "a/x");
    }
}
