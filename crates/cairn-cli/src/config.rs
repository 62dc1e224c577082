use std::path::Path;

use anyhow::Context;
use cairn_diff::DeltaConfig;
use cairn_store::StoreConfig;
use serde::{Deserialize, Serialize};

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "cairn.toml";

/// Who new index generations are attributed to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorConfig {
    pub name: String,
    pub email: String,
}

impl Default for AuthorConfig {
    fn default() -> Self {
        Self {
            name: std::env::var("USER").unwrap_or_else(|_| "unknown".into()),
            email: String::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CairnConfig {
    pub author: AuthorConfig,
    pub store: StoreConfig,
    pub delta: DeltaConfig,
}

impl CairnConfig {
    /// Read `explicit` if given, else `./cairn.toml` if it exists, else
    /// defaults. An explicit file that is missing is an error.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_diff::RenderMode;
    use cairn_store::SyncMode;

    #[test]
    fn empty_toml_is_default() {
        let c: CairnConfig = toml::from_str("").unwrap();
        assert_eq!(c, CairnConfig::default());
        assert_eq!(c.delta.context_lines, 3);
        assert_eq!(c.store.log_file, "objects.log");
    }

    #[test]
    fn sections_override_fields() {
        let c: CairnConfig = toml::from_str(
            r#"
            [author]
            name = "ada"
            email = "ada@example.com"

            [store]
            compression_level = 9
            sync_mode = "os_default"

            [delta]
            mode = "minimal"
            "#,
        )
        .unwrap();
        assert_eq!(c.author.name, "ada");
        assert_eq!(c.store.compression_level, 9);
        assert_eq!(c.store.sync_mode, SyncMode::OsDefault);
        assert_eq!(c.store.index_file, "objects.idx");
        assert_eq!(c.delta.mode, RenderMode::Minimal);
        assert_eq!(c.delta.context_lines, 3);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CairnConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.toml");
        std::fs::write(&path, "[delta]\ncontext_lines = 1\n").unwrap();
        let c = CairnConfig::load(Some(&path)).unwrap();
        assert_eq!(c.delta.context_lines, 1);
    }

    #[test]
    fn bad_toml_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[delta\n").unwrap();
        let err = CairnConfig::from_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("bad.toml"));
    }
}
