mod core;
mod error;
mod handle;
mod state;
mod types;

pub use self::core::PlayerCore;
pub use error::PlayerError;
pub use handle::PlayerHandle;
pub use state::{LoopMode, PlaybackState, ReplaygainMode};
pub use types::{PlayerSignal, PlayerStatus, PlaylistSnapshot};

pub(crate) use types::PlayerRequest;
