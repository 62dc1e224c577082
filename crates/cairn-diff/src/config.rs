use serde::{Deserialize, Serialize};

/// How a delta is rendered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Changed lines only.
    Minimal,
    /// Unified-diff hunks with context.
    #[default]
    Enhanced,
}

/// Delta rendering settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeltaConfig {
    pub mode: RenderMode,
    /// Common lines shown around each change in enhanced mode.
    pub context_lines: usize,
}

impl Default for DeltaConfig {
    fn default() -> Self {
        Self {
            mode: RenderMode::Enhanced,
            context_lines: 3,
        }
    }
}
