mod paths;
#[cfg(test)]
mod tests;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use paths::ConfigPaths;

use crate::core::{Result, SpindleError};
use crate::player::ReplaygainMode;

/// Main configuration structure for Spindle.
///
/// Read once at daemon startup; there is no hot-reload.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Playback engine settings.
    #[serde(default)]
    pub player: PlayerConfig,

    /// Media library settings.
    #[serde(default)]
    pub library: LibraryConfig,

    /// Desktop notification settings.
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

/// Options passed through to the playback engine at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Audio output sink name (mpv `--ao`). Engine default when unset.
    pub output: Option<String>,

    /// Audio filter chain entries (mpv `--af`), joined with commas.
    pub filters: Vec<String>,

    /// Demuxer cache size, e.g. "4096" (KiB). Engine default when unset.
    pub cache: Option<String>,

    /// Gapless audio playback.
    pub gapless: bool,

    /// Script files loaded into the engine.
    pub scripts: Vec<PathBuf>,

    /// Initial replaygain mode, applied right after startup.
    pub replaygain: Option<ReplaygainMode>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            output: None,
            filters: Vec::new(),
            cache: None,
            gapless: true,
            scripts: Vec::new(),
            replaygain: None,
        }
    }
}

/// Media library settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LibraryConfig {
    /// Path to the library SQLite database (beets-compatible `items` table).
    ///
    /// When unset, random continuation is disabled and playback stops at
    /// the end of the playlist.
    pub path: Option<PathBuf>,
}

/// Desktop notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    /// Show a "Now Playing" notification on track metadata updates.
    pub enabled: bool,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { enabled: false }
    }
}

impl Config {
    /// Load configuration from the given TOML file.
    ///
    /// # Errors
    /// Returns `SpindleError::Config` if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            SpindleError::Config(format!("could not read {}: {e}", path.display()))
        })?;

        toml::from_str(&content).map_err(|e| {
            SpindleError::Config(format!("could not parse {}: {e}", path.display()))
        })
    }

    /// Load configuration from the default XDG location.
    ///
    /// A missing config file is not an error; defaults are used.
    ///
    /// # Errors
    /// Returns `SpindleError::Config` if the file exists but cannot be
    /// read or parsed.
    pub fn load_default() -> Result<Self> {
        let path = ConfigPaths::main_config()?;

        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }
}
