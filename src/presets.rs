//! Named filter presets persisted to one flat JSON file.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::filter::FilterState;
use chrono::NaiveDate;

/// Filename of the preset store within the config directory.
pub const PRESETS_FILE: &str = "filter_presets.json";

/// The reusable part of a filter configuration: value filters and the date
/// window. Column selection, sampling, and row limit stay per-session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    #[serde(default)]
    pub value_filters: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<(NaiveDate, NaiveDate)>,
}

impl Preset {
    pub fn from_state(state: &FilterState) -> Self {
        Self {
            value_filters: state.value_filters.clone(),
            date_range: state.date_range,
        }
    }

    pub fn apply_to(&self, state: &mut FilterState) {
        state.value_filters = self.value_filters.clone();
        state.date_range = self.date_range;
    }
}

/// Load-all / save-all / delete-one access to the preset file.
pub struct PresetStore {
    path: PathBuf,
}

impl PresetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store under the user's config directory for the given app name.
    pub fn default_location(app_name: &str) -> Result<Self> {
        let dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);
        Ok(Self::new(dir.join(PRESETS_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All presets by name. A missing file is an empty store; an unparseable
    /// file is reported and treated as empty rather than aborting.
    pub fn load_all(&self) -> Result<BTreeMap<String, Preset>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        match serde_json::from_str(&content) {
            Ok(presets) => Ok(presets),
            Err(err) => {
                warn!(path = %self.path.display(), %err, "could not parse preset file");
                Ok(BTreeMap::new())
            }
        }
    }

    pub fn save_all(&self, presets: &BTreeMap<String, Preset>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(presets)?;

        // Use file locking to prevent concurrent writers clobbering each other
        let mut file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        file.lock_exclusive()?;
        file.write_all(json.as_bytes())?;
        file.flush()?;
        file.unlock()?;

        Ok(())
    }

    pub fn save(&self, name: &str, preset: Preset) -> Result<()> {
        let mut presets = self.load_all()?;
        presets.insert(name.to_string(), preset);
        self.save_all(&presets)
    }

    /// Remove one preset. Returns whether it existed.
    pub fn delete(&self, name: &str) -> Result<bool> {
        let mut presets = self.load_all()?;
        let existed = presets.remove(name).is_some();
        if existed {
            self.save_all(&presets)?;
        }
        Ok(existed)
    }
}
