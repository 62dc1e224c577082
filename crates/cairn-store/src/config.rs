use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// When flushed store files are synced to stable storage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// `fsync` both files at the end of every `write`.
    #[default]
    EveryWrite,
    /// Leave it to the OS page cache.
    OsDefault,
}

/// On-disk layout and durability settings for an object store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// File name of the content log inside the store directory.
    pub log_file: String,
    /// File name of the content index inside the store directory.
    pub index_file: String,
    /// zstd level used by `add_compressed_file`.
    pub compression_level: i32,
    pub sync_mode: SyncMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            log_file: "objects.log".into(),
            index_file: "objects.idx".into(),
            compression_level: 3,
            sync_mode: SyncMode::EveryWrite,
        }
    }
}

impl StoreConfig {
    pub fn log_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.log_file)
    }

    pub fn index_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.index_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = StoreConfig::default();
        assert_eq!(c.log_file, "objects.log");
        assert_eq!(c.index_file, "objects.idx");
        assert_eq!(c.compression_level, 3);
        assert_eq!(c.sync_mode, SyncMode::EveryWrite);
    }

    #[test]
    fn paths_join_dir() {
        let c = StoreConfig::default();
        assert_eq!(c.log_path(Path::new("/s")), PathBuf::from("/s/objects.log"));
        assert_eq!(c.index_path(Path::new("/s")), PathBuf::from("/s/objects.idx"));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let c: StoreConfig = serde_json::from_str(r#"{"sync_mode":"os_default"}"#).unwrap();
        assert_eq!(c.sync_mode, SyncMode::OsDefault);
        assert_eq!(c.log_file, "objects.log");
    }
}
