use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::filter::DEFAULT_ROW_LIMIT;
use crate::schema::PREVIEW_ROWS;

/// Filename of the app configuration within the config directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Defaults the CLI applies when flags are absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Field delimiter used to read shards.
    pub delimiter: char,
    /// Text encoding used to read shards.
    pub encoding: String,
    /// Maximum rows materialized per run.
    pub row_limit: usize,
    /// Rows shown in the schema preview.
    pub preview_rows: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            encoding: "utf-8".to_string(),
            row_limit: DEFAULT_ROW_LIMIT,
            preview_rows: PREVIEW_ROWS,
        }
    }
}

/// Manages the config directory and config file operations.
#[derive(Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);

        Ok(Self { config_dir })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_path(&self, path: &str) -> PathBuf {
        self.config_dir.join(path)
    }

    /// Ensure the config directory exists
    pub fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Load the configuration, falling back to defaults when no file exists.
    pub fn load_config(&self) -> Result<AppConfig> {
        let path = self.config_path(CONFIG_FILE);
        if !path.exists() {
            return Ok(AppConfig::default());
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save_config(&self, config: &AppConfig) -> Result<()> {
        self.ensure_config_dir()?;
        let content = toml::to_string_pretty(config)?;
        std::fs::write(self.config_path(CONFIG_FILE), content)?;
        Ok(())
    }
}
