//! Application settings (database location, pool size, listing defaults).
//!
//! The settings file is always `~/.config/reelvault/settings.toml`. Every
//! field is optional in the file; anything missing takes its default.

use std::path::{Path, PathBuf};

use reelvault_catalog::Movie;
use reelvault_db::{DEFAULT_POOL_SIZE, PagingSpec};
use serde::{Deserialize, Serialize};

use crate::error::LibraryError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub paging: PagingSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Library database file. Falls back to [`default_db_path`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub pool_size: usize,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: None,
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagingSettings {
    pub default_page_size: u32,
}

impl Default for PagingSettings {
    fn default() -> Self {
        Self {
            default_page_size: PagingSpec::<Movie>::DEFAULT_PAGE_SIZE,
        }
    }
}

/// Canonical path to the settings file: `~/.config/reelvault/settings.toml`.
pub fn settings_path() -> PathBuf {
    let config = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    config.join("reelvault").join("settings.toml")
}

/// Default database location: `<data_dir>/reelvault/reelvault.db`.
pub fn default_db_path() -> PathBuf {
    let data = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    data.join("reelvault").join("reelvault.db")
}

impl Settings {
    /// Load from [`settings_path`]. A missing file yields the defaults.
    pub fn load() -> Result<Self, LibraryError> {
        Self::load_from(&settings_path())
    }

    pub fn load_from(path: &Path) -> Result<Self, LibraryError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No settings file at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(LibraryError::io(path, e)),
        };
        toml::from_str(&contents).map_err(|e| LibraryError::InvalidSettings {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn save(&self) -> Result<(), LibraryError> {
        self.save_to(&settings_path())
    }

    /// Write atomically: a temp file next to `path`, then a rename.
    pub fn save_to(&self, path: &Path) -> Result<(), LibraryError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LibraryError::io(parent, e))?;
        }
        let serialized = self.to_toml()?;
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, serialized).map_err(|e| LibraryError::io(&tmp, e))?;
        std::fs::rename(&tmp, path).map_err(|e| LibraryError::io(path, e))?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, LibraryError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Resolve the database path using a priority chain:
    ///
    /// 1. CLI override (if `Some`)
    /// 2. `database.path` from the settings file
    /// 3. [`default_db_path`]
    pub fn resolve_db_path(&self, cli_override: Option<PathBuf>) -> PathBuf {
        cli_override
            .or_else(|| self.database.path.clone())
            .unwrap_or_else(default_db_path)
    }
}
