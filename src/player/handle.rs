use tokio::sync::{broadcast, mpsc, oneshot};

use super::types::{PlayerRequest, Reply};
use super::{
    LoopMode, PlayerError, PlayerSignal, PlayerStatus, PlaylistSnapshot, ReplaygainMode,
};

/// Cloneable handle to the player core task.
///
/// Every method marshals its request onto the core task and waits for the
/// reply; callers never touch player state directly.
#[derive(Clone)]
pub struct PlayerHandle {
    pub(super) requests: mpsc::Sender<PlayerRequest>,
    pub(super) signals: broadcast::Sender<PlayerSignal>,
}

impl PlayerHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> PlayerRequest,
    ) -> Result<T, PlayerError> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.requests
            .send(build(reply_tx))
            .await
            .map_err(|_| PlayerError::Closed)?;

        reply_rx.await.map_err(|_| PlayerError::Closed)?
    }

    /// Start playback; resumes, jumps to the first entry, or pulls a
    /// random track depending on the current state.
    ///
    /// # Errors
    /// Returns `PlayerError` when the engine rejects the transition.
    pub async fn play(&self) -> Result<(), PlayerError> {
        self.request(PlayerRequest::Play).await
    }

    /// Pause playback. No-op unless something is playing.
    ///
    /// # Errors
    /// Returns `PlayerError` when the engine rejects the pause.
    pub async fn pause(&self) -> Result<(), PlayerError> {
        self.request(PlayerRequest::Pause).await
    }

    /// Toggle between playing and paused/stopped.
    ///
    /// # Errors
    /// Returns `PlayerError` when the dispatched operation fails.
    pub async fn toggle(&self) -> Result<(), PlayerError> {
        self.request(PlayerRequest::Toggle).await
    }

    /// Stop playback and clear the playlist. The state moves to stopped
    /// even when the underlying engine commands fail.
    ///
    /// # Errors
    /// Returns `PlayerError::Closed` only; engine failures are logged.
    pub async fn stop(&self) -> Result<(), PlayerError> {
        self.request(PlayerRequest::Stop).await
    }

    /// Seek by a signed number of seconds within the current track.
    ///
    /// # Errors
    /// Returns `PlayerError` when the engine rejects the seek.
    pub async fn seek(&self, seconds: i64) -> Result<(), PlayerError> {
        self.request(|reply| PlayerRequest::Seek { seconds, reply })
            .await
    }

    /// Skip to the next playlist entry (forced: always advances).
    ///
    /// # Errors
    /// Returns `PlayerError` when the engine rejects the skip.
    pub async fn next(&self) -> Result<(), PlayerError> {
        self.request(PlayerRequest::Next).await
    }

    /// Go back one playlist entry (weak: no-op at the first entry).
    ///
    /// # Errors
    /// Returns `PlayerError` when the engine rejects the skip.
    pub async fn prev(&self) -> Result<(), PlayerError> {
        self.request(PlayerRequest::Prev).await
    }

    /// Jump to a playlist index.
    ///
    /// # Errors
    /// Returns `PlayerError::InvalidIndex` for out-of-range indices.
    pub async fn goto_index(&self, index: i64) -> Result<(), PlayerError> {
        self.request(|reply| PlayerRequest::Goto { index, reply })
            .await
    }

    /// Append a track. An empty path means "pick one random library
    /// track". `play` starts playback of the appended entry immediately.
    ///
    /// # Errors
    /// Returns `PlayerError::NoTrackAvailable` when the library has
    /// nothing to offer.
    pub async fn append_track(&self, path: String, play: bool) -> Result<(), PlayerError> {
        self.request(|reply| PlayerRequest::Append { path, play, reply })
            .await
    }

    /// Append every entry of a playlist file; parsing is the engine's
    /// business.
    ///
    /// # Errors
    /// Returns `PlayerError` when the engine rejects the file.
    pub async fn append_list(&self, path: String) -> Result<(), PlayerError> {
        self.request(|reply| PlayerRequest::AppendList { path, reply })
            .await
    }

    /// Remove the entry at `index`; -1 removes the current entry.
    ///
    /// # Errors
    /// Returns `PlayerError::InvalidIndex` for out-of-range indices.
    pub async fn remove_track(&self, index: i64) -> Result<(), PlayerError> {
        self.request(|reply| PlayerRequest::Remove { index, reply })
            .await
    }

    /// Set the loop mode; the two engine loop flags stay mutually
    /// exclusive.
    ///
    /// # Errors
    /// Returns `PlayerError` when the engine rejects a property write.
    pub async fn set_loop(&self, mode: LoopMode) -> Result<(), PlayerError> {
        self.request(|reply| PlayerRequest::SetLoop { mode, reply })
            .await
    }

    /// Set the replaygain mode; replaces the previous filter, never
    /// stacks.
    ///
    /// # Errors
    /// Returns `PlayerError` when the engine rejects the filter change.
    pub async fn set_replaygain(&self, mode: ReplaygainMode) -> Result<(), PlayerError> {
        self.request(|reply| PlayerRequest::SetReplaygain { mode, reply })
            .await
    }

    /// Read a full status snapshot.
    ///
    /// # Errors
    /// Returns `PlayerError::Closed` when the player task is gone.
    pub async fn status(&self) -> Result<PlayerStatus, PlayerError> {
        self.request(PlayerRequest::Status).await
    }

    /// Read a playlist snapshot.
    ///
    /// # Errors
    /// Returns `PlayerError::Closed` when the player task is gone.
    pub async fn playlist(&self) -> Result<PlaylistSnapshot, PlayerError> {
        self.request(PlayerRequest::Playlist).await
    }

    /// Ask the engine to quit; the pump terminates once the engine
    /// reports shutdown.
    ///
    /// # Errors
    /// Returns `PlayerError` when the engine rejects the quit command.
    pub async fn quit(&self) -> Result<(), PlayerError> {
        self.request(PlayerRequest::Quit).await
    }

    /// Subscribe to outward status/track notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerSignal> {
        self.signals.subscribe()
    }
}
