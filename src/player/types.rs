use std::collections::HashMap;

use tokio::sync::oneshot;

use super::{LoopMode, PlaybackState, PlayerError, ReplaygainMode};

/// Snapshot of everything a status display needs, read on demand.
#[derive(Debug, Clone)]
pub struct PlayerStatus {
    /// Current playback state
    pub state: PlaybackState,

    /// Path or URI of the current track, empty when nothing is loaded
    pub path: String,

    /// Track length in seconds, 0 when unknown
    pub length: f64,

    /// Playback position in seconds
    pub position: f64,

    /// Playback position as a percentage of the track length
    pub percent: f64,

    /// Track tags (title, artist, album, ...), never cached
    pub metadata: HashMap<String, String>,

    /// Current loop mode
    pub loop_mode: LoopMode,

    /// Current replaygain mode
    pub replaygain: ReplaygainMode,
}

/// Snapshot of the engine-owned playlist.
#[derive(Debug, Clone)]
pub struct PlaylistSnapshot {
    /// Track references in playlist order
    pub tracks: Vec<String>,

    /// Number of entries
    pub count: i64,

    /// Cursor: index of the current entry, -1 when none
    pub position: i64,
}

/// Outward notification fired by the event pump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerSignal {
    /// The playback state actually changed (no-op transitions stay silent)
    StatusChanged(PlaybackState),

    /// The current track or its metadata changed
    TrackChanged,
}

pub(crate) type Reply<T> = oneshot::Sender<Result<T, PlayerError>>;

/// A control request marshaled onto the player core task.
pub(crate) enum PlayerRequest {
    Play(Reply<()>),
    Pause(Reply<()>),
    Toggle(Reply<()>),
    Stop(Reply<()>),
    Seek { seconds: i64, reply: Reply<()> },
    Next(Reply<()>),
    Prev(Reply<()>),
    Goto { index: i64, reply: Reply<()> },
    Append { path: String, play: bool, reply: Reply<()> },
    AppendList { path: String, reply: Reply<()> },
    Remove { index: i64, reply: Reply<()> },
    SetLoop { mode: LoopMode, reply: Reply<()> },
    SetReplaygain { mode: ReplaygainMode, reply: Reply<()> },
    Status(Reply<PlayerStatus>),
    Playlist(Reply<PlaylistSnapshot>),
    Quit(Reply<()>),
}
