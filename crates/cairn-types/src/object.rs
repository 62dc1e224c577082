use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Size in bytes of a content digest.
pub const HASH_SIZE: usize = 32;

/// Content digest of a stored blob.
///
/// Held as raw bytes. The index file writes these 32 bytes verbatim, so the
/// on-disk form never depends on integer width or signedness.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId([u8; HASH_SIZE]);

impl ObjectId {
    /// Wrap a digest that was computed elsewhere.
    pub const fn from_hash(hash: [u8; HASH_SIZE]) -> Self {
        Self(hash)
    }

    /// Build from a slice, checking its length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypeError> {
        let arr: [u8; HASH_SIZE] = bytes.try_into().map_err(|_| TypeError::InvalidLength {
            expected: HASH_SIZE,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    /// The all-zero digest. Never produced by hashing in practice; used as a
    /// placeholder in tests and unfilled records.
    pub const fn null() -> Self {
        Self([0u8; HASH_SIZE])
    }

    pub fn is_null(&self) -> bool {
        self.0 == [0u8; HASH_SIZE]
    }

    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 8 hex characters, for listings.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.short_hex())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; HASH_SIZE]> for ObjectId {
    fn from(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }
}

impl From<ObjectId> for [u8; HASH_SIZE] {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ObjectId {
        let mut raw = [0u8; HASH_SIZE];
        for (i, b) in raw.iter_mut().enumerate() {
            *b = i as u8 * 7;
        }
        ObjectId::from_hash(raw)
    }

    #[test]
    fn null_is_all_zeros() {
        let null = ObjectId::null();
        assert!(null.is_null());
        assert!(!sample().is_null());
    }

    #[test]
    fn hex_roundtrip() {
        let id = sample();
        let parsed: ObjectId = id.to_hex().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn high_bytes_survive() {
        // 0xFF must stay 0xFF: no sign extension anywhere.
        let id = ObjectId::from_hash([0xFF; HASH_SIZE]);
        assert_eq!(id.to_hex(), "ff".repeat(HASH_SIZE));
        assert_eq!(id.as_bytes()[0], 0xFF);
    }

    #[test]
    fn from_slice_rejects_wrong_length() {
        let err = ObjectId::from_slice(&[1, 2, 3]).unwrap_err();
        assert_eq!(
            err,
            TypeError::InvalidLength {
                expected: HASH_SIZE,
                actual: 3
            }
        );
    }

    #[test]
    fn from_hex_rejects_garbage() {
        assert!(matches!(
            ObjectId::from_hex("zz"),
            Err(TypeError::InvalidHex(_))
        ));
    }

    #[test]
    fn short_hex_is_8_chars() {
        assert_eq!(sample().short_hex().len(), 8);
        assert!(sample().to_hex().starts_with(&sample().short_hex()));
    }

    #[test]
    fn serde_roundtrip() {
        let id = sample();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: ObjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }
}
