use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cwsync_core::{Credentials, SyncConfig};
use serde::{Deserialize, Serialize};

const CONFIG_DIR: &str = ".cwsync";
const CONFIG_FILE: &str = "config.json";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// CLI configuration loaded from a JSON file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CliConfig {
    pub credentials: Credentials,

    /// Gateway and sync tunables
    #[serde(default)]
    pub sync: SyncConfig,

    /// Pause between poll cycles in `watch` mode
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

/// `~/.cwsync/config.json`
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join(CONFIG_FILE)
}

impl CliConfig {
    /// Load config from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: CliConfig = serde_json::from_str(json)?;
        anyhow::ensure!(
            !config.credentials.email.is_empty(),
            "credentials.email must not be empty"
        );
        anyhow::ensure!(config.poll_interval_secs > 0, "pollIntervalSecs must be positive");
        Ok(config)
    }
}
