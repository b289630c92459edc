use thiserror::Error;

use crate::engine::EngineError;
use crate::library::LibraryError;

/// Error types for the Spindle daemon.
///
/// Covers everything that can go wrong during startup and top-level
/// operation. Per-request playback errors live in
/// [`crate::player::PlayerError`]; this enum is for conditions that are
/// fatal to the process.
#[derive(Error, Debug)]
pub enum SpindleError {
    /// Configuration file missing, unreadable, or invalid
    #[error("configuration error: {0}")]
    Config(String),

    /// Underlying I/O failure
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The playback engine could not be started or initialized
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// D-Bus connection or name acquisition failure
    #[error("bus error: {0}")]
    Bus(#[from] zbus::Error),

    /// Library database could not be opened
    #[error("library error: {0}")]
    Library(#[from] LibraryError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SpindleError>;
