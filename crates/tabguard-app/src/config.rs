//! Replay configuration file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tabguard_core::{PipelineConfig, Settings, StaticPolicy};

/// Name of the config file inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Everything needed to build a pipeline. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Pipeline tunables.
    pub pipeline: PipelineConfig,
    /// User settings.
    pub settings: Settings,
    /// Policy table.
    pub policy: StaticPolicy,
}

impl AppConfig {
    /// Loads a config file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = serde_json::from_str(&raw)
            .with_context(|| format!("invalid config {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Loads `path` if given, else the platform default if it exists, else defaults.
    pub fn resolve(path: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }
}

/// Platform config file location, e.g. `~/.config/tabguard/config.json`.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "tabguard", "TabGuard").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}
