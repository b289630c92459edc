use std::{env, path::PathBuf};

use crate::core::{Result, SpindleError};

/// Utility struct for locating configuration and runtime file paths
///
/// Follows the XDG Base Directory specification.
pub struct ConfigPaths;

impl ConfigPaths {
    /// Returns the configuration directory path for the daemon
    ///
    /// - First checks `XDG_CONFIG_HOME`
    /// - Falls back to `$HOME/.config`
    /// - Appends "spindle" to the base config directory
    ///
    /// # Errors
    /// Returns an error if neither `XDG_CONFIG_HOME` nor `HOME` is set
    pub fn config_dir() -> Result<PathBuf> {
        let config_home = env::var("XDG_CONFIG_HOME")
            .or_else(|_| env::var("HOME").map(|home| format!("{home}/.config")))
            .map_err(|_| {
                SpindleError::Config(
                    "neither XDG_CONFIG_HOME nor HOME environment variable found".to_string(),
                )
            })?;

        Ok(PathBuf::from(config_home).join("spindle"))
    }

    /// Returns the path to the main configuration file
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be determined
    pub fn main_config() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the directory for runtime files (the engine IPC socket)
    ///
    /// Uses `XDG_RUNTIME_DIR` when available, `/tmp` otherwise.
    pub fn runtime_dir() -> PathBuf {
        env::var("XDG_RUNTIME_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }

    /// Returns the path for the engine IPC socket, unique per process.
    pub fn engine_socket() -> PathBuf {
        Self::runtime_dir().join(format!("spindle-mpv-{}.sock", std::process::id()))
    }
}
