use cairn_types::ObjectId;

/// Domain-separated BLAKE3 content hasher.
///
/// The domain tag is fed into the hasher ahead of the data, so digests from
/// different domains never collide even for identical bytes.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for blobs appended to the content log.
    pub const BLOB: Self = Self {
        domain: "cairn-blob-v1",
    };
    /// Hasher for rendered delta reports stored as blobs.
    pub const DELTA: Self = Self {
        domain: "cairn-delta-v1",
    };

    fn start(&self) -> blake3::Hasher {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ObjectId {
        let mut hasher = self.start();
        hasher.update(data);
        ObjectId::from_hash(*hasher.finalize().as_bytes())
    }

    pub fn domain(&self) -> &str {
        self.domain
    }
}
