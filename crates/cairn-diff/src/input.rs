use crate::deltafile::{DeltaFile, FileSpec};
use crate::error::DiffResult;

/// The two sides of one delta: their specifications and tokenized contents.
///
/// Construction tokenizes both files up front, so an input that exists is
/// always well-formed and no table is ever built for a file that could not
/// be read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeltaInput {
    spec_a: FileSpec,
    spec_b: FileSpec,
    file_a: DeltaFile,
    file_b: DeltaFile,
}

impl DeltaInput {
    /// Load and tokenize both files.
    pub fn new(spec_a: FileSpec, spec_b: FileSpec) -> DiffResult<Self> {
        let file_a = DeltaFile::load(&spec_a)?;
        let file_b = DeltaFile::load(&spec_b)?;
        Ok(Self::from_files(spec_a, file_a, spec_b, file_b))
    }

    pub fn from_files(
        spec_a: FileSpec,
        file_a: DeltaFile,
        spec_b: FileSpec,
        file_b: DeltaFile,
    ) -> Self {
        Self {
            spec_a,
            spec_b,
            file_a,
            file_b,
        }
    }

    /// Build an input from in-memory contents, e.g. blobs read back from a
    /// store.
    pub fn from_bytes(
        label_a: impl Into<String>,
        a: &[u8],
        label_b: impl Into<String>,
        b: &[u8],
    ) -> Self {
        let label_a = label_a.into();
        let label_b = label_b.into();
        Self::from_files(
            FileSpec::with_label(&label_a, label_a.clone()),
            DeltaFile::from_bytes(a),
            FileSpec::with_label(&label_b, label_b.clone()),
            DeltaFile::from_bytes(b),
        )
    }

    /// The old side.
    pub fn spec_a(&self) -> &FileSpec {
        &self.spec_a
    }

    /// The new side.
    pub fn spec_b(&self) -> &FileSpec {
        &self.spec_b
    }

    pub fn file_a(&self) -> &DeltaFile {
        &self.file_a
    }

    pub fn file_b(&self) -> &DeltaFile {
        &self.file_b
    }
}
