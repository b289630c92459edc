use thiserror::Error;

use crate::engine::EngineError;

/// Errors returned to control-surface callers
#[derive(Error, Debug)]
pub enum PlayerError {
    /// The engine rejected a command or property write; carries the
    /// engine's own message
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Playlist index out of bounds
    #[error("playlist index {0} out of range")]
    InvalidIndex(i64),

    /// Random continuation found nothing to play
    #[error("no track available in library")]
    NoTrackAvailable,

    /// Unrecognized loop or replaygain mode string
    #[error("invalid mode {0:?}")]
    InvalidMode(String),

    /// The player task is no longer running
    #[error("player is shut down")]
    Closed,
}
