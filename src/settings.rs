//! Persisted last-used paths.
//!
//! The tool remembers the manifest, cookie file and output directory used on
//! the previous run and offers them as defaults on the next one. State lives
//! in a small JSON file under the user config directory; a missing file is
//! not an error, it just means no history yet.

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Errors reading or writing the settings file.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// I/O error on the settings file.
    #[error("failed to access settings file: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file held invalid JSON.
    #[error("failed to parse settings file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Last-used paths, all optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Manifest CSV used on the previous run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_manifest: Option<PathBuf>,
    /// Cookie file used on the previous run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_cookies: Option<PathBuf>,
    /// Output directory used on the previous run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_output_dir: Option<PathBuf>,
}

impl Settings {
    /// Loads settings from `path`. A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Io`] when the file exists but cannot be
    /// read, or [`SettingsError::Parse`] when it holds invalid JSON.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            debug!(path = %path.display(), "no settings file; using defaults");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Writes settings to `path`, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Io`] on write failure or
    /// [`SettingsError::Parse`] on serialization failure.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        debug!(path = %path.display(), "saved settings");
        Ok(())
    }
}

/// Resolves the default settings path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/imdb-exporter/state.json`
/// 2. `$HOME/.config/imdb-exporter/state.json`
#[must_use]
pub fn default_settings_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("imdb-exporter")
                .join("state.json"),
        );
    }

    let home = env_var_non_empty("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("imdb-exporter")
            .join("state.json"),
    )
}

fn env_var_non_empty(name: &str) -> Option<std::ffi::OsString> {
    env::var_os(name).filter(|value| !value.is_empty())
}
