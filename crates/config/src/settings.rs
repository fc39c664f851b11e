// User settings
// Loaded from ~/.config/qsogrid/settings.toml

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const DEFAULT_DIRECTORY_ENDPOINT: &str = "https://xmldata.qrz.com/xml/current/";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("cannot read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("cannot write {path}: {source}")]
    Write { path: PathBuf, source: std::io::Error },
    #[error("error parsing {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Persistent geolocation cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// SQLite file backing the persistent tier
    pub path: PathBuf,
}

impl Default for CacheSettings {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("qsogrid");
        Self {
            path: data_dir.join("location_cache.sqlite"),
        }
    }
}

/// External directory (QRZ XML) settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorySettings {
    /// When false, resolution never leaves the local tiers
    pub enabled: bool,
    pub endpoint: String,
    /// Overridden by QSOGRID_QRZ_USERNAME / the saved credentials file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub timeout_secs: u64,
}

impl Default for DirectorySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: DEFAULT_DIRECTORY_ENDPOINT.to_string(),
            username: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub cache: CacheSettings,
    pub directory: DirectorySettings,
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("qsogrid");
        config_dir.join("settings.toml")
    }

    /// Load settings from the default location.
    ///
    /// A missing file yields defaults and writes a commented template;
    /// a malformed file is an error rather than a silent fallback.
    pub fn load() -> Result<Self, SettingsError> {
        let path = Self::config_path();
        if !path.exists() {
            Self::create_default_file(&path);
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents).map_err(|message| SettingsError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn from_toml(contents: &str) -> Result<Self, String> {
        toml::from_str(contents).map_err(|e| e.to_string())
    }

    /// Save current settings to `path`
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let write_err = |source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let text = toml::to_string_pretty(self).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        fs::write(path, text).map_err(write_err)
    }

    /// Create default settings file with comments
    fn create_default_file(path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                log::warn!("cannot create config directory {}: {}", parent.display(), e);
                return;
            }
        }

        let default_config = format!(
            r#"# qsogrid settings

[cache]
# SQLite file for the persistent geolocation cache
# path = "/path/to/location_cache.sqlite"

[directory]
# Set to false to resolve from local evidence and cache only
enabled = true
endpoint = "{DEFAULT_DIRECTORY_ENDPOINT}"
timeout_secs = {DEFAULT_TIMEOUT_SECS}
# Credentials: `qsogrid login` or QSOGRID_QRZ_USERNAME / QSOGRID_QRZ_PASSWORD
"#
        );

        if let Err(e) = fs::write(path, default_config) {
            log::warn!("cannot write default {}: {}", path.display(), e);
        }
    }
}
