use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::PlayerError;

/// Current playback state of the daemon.
///
/// Exactly one value is live at any time, mutated only on the player core
/// task. `Stopped` means the engine is idle with nothing queued to resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Daemon started, engine has not settled yet
    Starting,

    /// Nothing playing, nothing queued to resume
    Stopped,

    /// A track is playing
    Playing,

    /// A track is loaded and paused
    Paused,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Starting => "starting",
            Self::Stopped => "stop",
            Self::Playing => "play",
            Self::Paused => "pause",
        };
        write!(f, "{s}")
    }
}

/// Loop mode, orthogonal to the playback state.
///
/// Persisted as two engine properties (loop current file, loop whole
/// list) which the setter keeps mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopMode {
    /// No looping
    #[default]
    None,

    /// Repeat the current track
    Track,

    /// Repeat the whole playlist
    List,
}

impl fmt::Display for LoopMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Track => "track",
            Self::List => "list",
        };
        write!(f, "{s}")
    }
}

impl FromStr for LoopMode {
    type Err = PlayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "track" => Ok(Self::Track),
            "list" => Ok(Self::List),
            other => Err(PlayerError::InvalidMode(other.to_string())),
        }
    }
}

/// Replaygain volume-normalization mode.
///
/// Realized as a labeled audio filter in the engine's filter chain;
/// switching modes replaces the filter, never stacks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplaygainMode {
    /// No volume normalization
    #[default]
    None,

    /// Per-track gain
    Track,

    /// Per-album gain
    Album,
}

impl fmt::Display for ReplaygainMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Track => "track",
            Self::Album => "album",
        };
        write!(f, "{s}")
    }
}

impl FromStr for ReplaygainMode {
    type Err = PlayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "track" => Ok(Self::Track),
            "album" => Ok(Self::Album),
            other => Err(PlayerError::InvalidMode(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playback_state_bus_strings() {
        assert_eq!(PlaybackState::Starting.to_string(), "starting");
        assert_eq!(PlaybackState::Stopped.to_string(), "stop");
        assert_eq!(PlaybackState::Playing.to_string(), "play");
        assert_eq!(PlaybackState::Paused.to_string(), "pause");
    }

    #[test]
    fn loop_mode_round_trip() {
        for mode in [LoopMode::None, LoopMode::Track, LoopMode::List] {
            assert_eq!(mode.to_string().parse::<LoopMode>().ok(), Some(mode));
        }

        assert!(matches!(
            "shuffle".parse::<LoopMode>(),
            Err(PlayerError::InvalidMode(m)) if m == "shuffle"
        ));
    }

    #[test]
    fn replaygain_mode_round_trip() {
        for mode in [
            ReplaygainMode::None,
            ReplaygainMode::Track,
            ReplaygainMode::Album,
        ] {
            assert_eq!(mode.to_string().parse::<ReplaygainMode>().ok(), Some(mode));
        }

        assert!("loud".parse::<ReplaygainMode>().is_err());
    }
}
