//! File-backed layout storage.
//!
//! Each profile has its own file, `dashboard_state_{PROFILE}.json`, holding a
//! JSON object keyed by system name. A dashboard only reads and writes its own
//! system's section; saving keeps every other section as it was. The last used
//! profile lives in `app_config.json`.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ConfigError;
use crate::error::LayoutError;
use crate::record::LayoutRecord;

pub const APP_CONFIG_FILE: &str = "app_config.json";

/// Named layout variant. Each profile persists to its own file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Profile {
    #[default]
    All,
    Graph,
    Gauge,
}

impl Profile {
    pub const VARIANTS: [Profile; 3] = [Profile::All, Profile::Graph, Profile::Gauge];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::Graph => "GRAPH",
            Self::Gauge => "GAUGE",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Profile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::VARIANTS
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ConfigError::UnknownProfile(s.to_string()))
    }
}

/// Contents of `app_config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct AppState {
    last_profile: Profile,
    system_name: String,
}

/// Layout files of one system in one directory.
#[derive(Debug, Clone)]
pub struct LayoutStore {
    dir: PathBuf,
    system: String,
}

impl LayoutStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, system: impl Into<String>) -> Self {
        Self { dir: dir.into(), system: system.into() }
    }

    #[must_use]
    pub fn system(&self) -> &str {
        &self.system
    }

    #[must_use]
    pub fn profile_path(&self, profile: Profile) -> PathBuf {
        self.dir.join(format!("dashboard_state_{profile}.json"))
    }

    #[must_use]
    pub fn app_config_path(&self) -> PathBuf {
        self.dir.join(APP_CONFIG_FILE)
    }

    /// Read this system's layout for `profile`.
    ///
    /// Returns `Ok(None)` when the file or the system's section does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::PersistenceRead`] when the file cannot be read and
    /// [`LayoutError::MalformedRecord`] when it is not valid layout JSON.
    pub fn load(&self, profile: Profile) -> Result<Option<LayoutRecord>, LayoutError> {
        let path = self.profile_path(profile);
        let Some(mut sections) = read_sections(&path)? else {
            debug!(path = %path.display(), "no layout file");
            return Ok(None);
        };
        let Some(section) = sections.remove(&self.system) else {
            debug!(path = %path.display(), system = %self.system, "no layout section for system");
            return Ok(None);
        };
        let record = serde_json::from_value(section).map_err(|source| LayoutError::MalformedRecord { path, source })?;
        Ok(Some(record))
    }

    /// Write this system's layout for `profile`, keeping other systems' sections.
    ///
    /// An unreadable or malformed existing file is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::PersistenceWrite`] when the file cannot be written.
    pub fn save(&self, profile: Profile, record: &LayoutRecord) -> Result<(), LayoutError> {
        let path = self.profile_path(profile);
        let mut sections = match read_sections(&path) {
            Ok(sections) => sections.unwrap_or_default(),
            Err(error) => {
                warn!(%error, "replacing unreadable layout file");
                serde_json::Map::new()
            }
        };
        sections.insert(self.system.clone(), serde_json::to_value(record)?);
        write_json(&self.dir, &path, &serde_json::Value::Object(sections))?;
        info!(path = %path.display(), system = %self.system, tiles = record.tiles.len(), "layout saved");
        Ok(())
    }

    /// The profile this system used last, or `ALL` when none is recorded.
    #[must_use]
    pub fn load_last_profile(&self) -> Profile {
        let path = self.app_config_path();
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(error) => {
                if error.kind() != ErrorKind::NotFound {
                    warn!(path = %path.display(), %error, "cannot read app config");
                }
                return Profile::default();
            }
        };
        match serde_json::from_str::<AppState>(&raw) {
            Ok(state) if state.system_name == self.system => state.last_profile,
            Ok(state) => {
                debug!(stored = %state.system_name, system = %self.system, "app config belongs to another system");
                Profile::default()
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "malformed app config");
                Profile::default()
            }
        }
    }

    /// Remember `profile` as this system's last used profile.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::PersistenceWrite`] when the file cannot be written.
    pub fn save_last_profile(&self, profile: Profile) -> Result<(), LayoutError> {
        let state = AppState { last_profile: profile, system_name: self.system.clone() };
        write_json(&self.dir, &self.app_config_path(), &state)
    }
}

/// Read a profile file as a map of system sections. `Ok(None)` if missing.
fn read_sections(path: &Path) -> Result<Option<serde_json::Map<String, serde_json::Value>>, LayoutError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(LayoutError::PersistenceRead { path: path.to_path_buf(), source }),
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| LayoutError::MalformedRecord { path: path.to_path_buf(), source })
}

fn write_json<T: Serialize>(dir: &Path, path: &Path, value: &T) -> Result<(), LayoutError> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::create_dir_all(dir)
        .and_then(|()| std::fs::write(path, json))
        .map_err(|source| LayoutError::PersistenceWrite { path: path.to_path_buf(), source })
}
