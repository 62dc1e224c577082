use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Who produced an index generation, and when.
///
/// The timestamp is kept at millisecond precision because that is what the
/// index file stores.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub email: String,
    pub timestamp: DateTime<Utc>,
}

impl Author {
    /// An author stamped with the current wall-clock time.
    pub fn now(name: impl Into<String>, email: impl Into<String>) -> Self {
        let now = Utc::now();
        // Truncate to what survives a round trip through the index file.
        let timestamp = Utc
            .timestamp_millis_opt(now.timestamp_millis())
            .single()
            .unwrap_or(now);
        Self {
            name: name.into(),
            email: email.into(),
            timestamp,
        }
    }

    /// Rebuild an author from its persisted parts.
    pub fn from_parts(
        name: impl Into<String>,
        email: impl Into<String>,
        timestamp_ms: i64,
    ) -> Result<Self, TypeError> {
        let timestamp = Utc
            .timestamp_millis_opt(timestamp_ms)
            .single()
            .ok_or(TypeError::InvalidTimestamp(timestamp_ms))?;
        Ok(Self {
            name: name.into(),
            email: email.into(),
            timestamp,
        })
    }

    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }
}

impl fmt::Debug for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Author({} <{}> @{})", self.name, self.email, self.timestamp_ms())
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} <{}> {}",
            self.name,
            self.email,
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_produces_reasonable_timestamp() {
        let author = Author::now("ada", "ada@example.org");
        // After 2020-01-01.
        assert!(author.timestamp_ms() > 1_577_836_800_000);
    }

    #[test]
    fn parts_roundtrip() {
        let author = Author::now("ada", "ada@example.org");
        let rebuilt =
            Author::from_parts(&author.name, &author.email, author.timestamp_ms()).unwrap();
        assert_eq!(author, rebuilt);
    }

    #[test]
    fn from_parts_rejects_out_of_range() {
        let err = Author::from_parts("x", "y", i64::MAX).unwrap_err();
        assert_eq!(err, TypeError::InvalidTimestamp(i64::MAX));
    }

    #[test]
    fn display_format() {
        let author = Author::from_parts("ada", "ada@example.org", 0).unwrap();
        assert_eq!(
            author.to_string(),
            "ada <ada@example.org> 1970-01-01 00:00:00 UTC"
        );
    }
}
