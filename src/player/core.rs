use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::types::PlayerRequest;
use super::{
    LoopMode, PlaybackState, PlayerError, PlayerHandle, PlayerSignal, PlayerStatus,
    PlaylistSnapshot, ReplaygainMode,
};
use crate::engine::{Engine, EngineEvent, PropertyValue};
use crate::library::MediaLibrary;
use crate::notify::Notifier;

const REQUEST_CHANNEL_CAPACITY: usize = 32;
const SIGNAL_CHANNEL_CAPACITY: usize = 64;

/// Label of our replaygain filter in the engine's filter chain.
const REPLAYGAIN_FILTER_LABEL: &str = "@replaygain";

/// Player core: the single owner of all mutable playback state.
///
/// Runs as one task that is both the event pump and the handler for
/// control requests, so every state mutation happens on one task and
/// every engine event is fully handled before the next one is read.
/// Nothing else holds the engine.
pub struct PlayerCore<E> {
    engine: E,
    events: mpsc::Receiver<EngineEvent>,
    requests: mpsc::Receiver<PlayerRequest>,
    requests_open: bool,
    signals: broadcast::Sender<PlayerSignal>,
    library: Arc<dyn MediaLibrary>,
    notifier: Option<Notifier>,

    state: PlaybackState,
    /// Cached playlist cursor, -1 when no entry is current. Re-read from
    /// the engine after every mutation that can move it.
    cursor: i64,
    loop_mode: LoopMode,
    replaygain: ReplaygainMode,
}

impl<E: Engine + 'static> PlayerCore<E> {
    /// Spawn the player core task.
    ///
    /// `events` is the engine event stream produced by the engine
    /// adapter. The returned handle is the only way in; the join handle
    /// completes once the engine reports shutdown.
    pub fn spawn(
        engine: E,
        events: mpsc::Receiver<EngineEvent>,
        library: Arc<dyn MediaLibrary>,
        notifier: Option<Notifier>,
    ) -> (PlayerHandle, JoinHandle<()>) {
        let (requests_tx, requests_rx) = mpsc::channel(REQUEST_CHANNEL_CAPACITY);
        let (signals_tx, _) = broadcast::channel(SIGNAL_CHANNEL_CAPACITY);

        let core = Self {
            engine,
            events,
            requests: requests_rx,
            requests_open: true,
            signals: signals_tx.clone(),
            library,
            notifier,
            state: PlaybackState::Starting,
            cursor: -1,
            loop_mode: LoopMode::default(),
            replaygain: ReplaygainMode::default(),
        };

        let handle = PlayerHandle {
            requests: requests_tx,
            signals: signals_tx,
        };

        let task = tokio::spawn(core.run());

        (handle, task)
    }

    async fn run(mut self) {
        loop {
            tokio::select! {
                request = self.requests.recv(), if self.requests_open => match request {
                    Some(request) => self.handle_request(request).await,
                    None => {
                        // All handles dropped; wind the engine down. The
                        // shutdown event closes the loop.
                        self.requests_open = false;
                        if let Err(e) = self.engine.command(&["quit"]).await {
                            warn!("could not quit engine: {e}");
                            break;
                        }
                    }
                },
                event = self.events.recv() => match event {
                    Some(EngineEvent::Shutdown) => {
                        info!("engine shut down, stopping event pump");
                        break;
                    }
                    Some(event) => self.handle_event(event).await,
                    None => {
                        warn!("engine event stream ended unexpectedly");
                        break;
                    }
                },
            }
        }
    }

    async fn handle_request(&mut self, request: PlayerRequest) {
        use PlayerRequest::*;

        // A caller that gave up waiting is not an error.
        match request {
            Play(reply) => {
                let _ = reply.send(self.play().await);
            }
            Pause(reply) => {
                let _ = reply.send(self.pause().await);
            }
            Toggle(reply) => {
                let _ = reply.send(self.toggle().await);
            }
            Stop(reply) => {
                let _ = reply.send(self.stop().await);
            }
            Seek { seconds, reply } => {
                let _ = reply.send(self.seek(seconds).await);
            }
            Next(reply) => {
                let _ = reply.send(self.next().await);
            }
            Prev(reply) => {
                let _ = reply.send(self.prev().await);
            }
            Goto { index, reply } => {
                let _ = reply.send(self.goto(index).await);
            }
            Append { path, play, reply } => {
                let _ = reply.send(self.append_track(path, play).await);
            }
            AppendList { path, reply } => {
                let _ = reply.send(self.append_list(&path).await);
            }
            Remove { index, reply } => {
                let _ = reply.send(self.remove(index).await);
            }
            SetLoop { mode, reply } => {
                let _ = reply.send(self.set_loop(mode).await);
            }
            SetReplaygain { mode, reply } => {
                let _ = reply.send(self.set_replaygain(mode).await);
            }
            Status(reply) => {
                let status = self.status().await;
                let _ = reply.send(Ok(status));
            }
            Playlist(reply) => {
                let snapshot = self.playlist().await;
                let _ = reply.send(Ok(snapshot));
            }
            Quit(reply) => {
                let _ = reply.send(self.quit().await);
            }
        }
    }

    async fn handle_event(&mut self, event: EngineEvent) {
        debug!("engine event: {event}");

        match event {
            EngineEvent::Idle => self.handle_idle().await,
            EngineEvent::Pause => self.set_state(PlaybackState::Paused),
            EngineEvent::Unpause | EngineEvent::PlaybackRestart => {
                self.set_state(PlaybackState::Playing);
            }
            EngineEvent::StartFile => {
                self.cursor = self.playlist_position().await;
                self.send_signal(PlayerSignal::TrackChanged);
            }
            EngineEvent::EndFile => {}
            EngineEvent::MetadataUpdate => {
                self.send_signal(PlayerSignal::TrackChanged);
                self.notify_now_playing().await;
            }
            EngineEvent::LogMessage {
                level,
                prefix,
                text,
            } => match level.as_str() {
                "fatal" | "error" => tracing::error!(target: "spindle::engine", "{prefix}: {text}"),
                "warn" => tracing::warn!(target: "spindle::engine", "{prefix}: {text}"),
                _ => tracing::debug!(target: "spindle::engine", "{prefix}: {text}"),
            },
            // Handled by the run loop before dispatch.
            EngineEvent::Shutdown => {}
            EngineEvent::Other(name) => debug!("ignoring engine event {name}"),
        }
    }

    /// Engine went idle. During startup this is just the engine settling;
    /// afterwards it means the playlist ran out and random continuation
    /// decides between a fresh track and stopping.
    async fn handle_idle(&mut self) {
        match self.state {
            PlaybackState::Starting => {
                // Not a user-visible change; no notification.
                self.state = PlaybackState::Stopped;
            }
            PlaybackState::Stopped => {}
            PlaybackState::Playing | PlaybackState::Paused => {
                if let Err(e) = self.append_track(String::new(), true).await {
                    info!("not continuing playback: {e}");
                    self.set_state(PlaybackState::Stopped);
                    self.cursor = -1;
                    self.send_signal(PlayerSignal::TrackChanged);
                }
            }
        }
    }

    async fn play(&mut self) -> Result<(), PlayerError> {
        match self.state {
            PlaybackState::Starting | PlaybackState::Playing => Ok(()),
            PlaybackState::Stopped => {
                if self.playlist_count().await > 0 {
                    self.goto(0).await?;
                } else {
                    self.append_track(String::new(), true).await?;
                }
                self.engine
                    .set_property("pause", PropertyValue::Flag(false))
                    .await?;
                self.set_state(PlaybackState::Playing);
                Ok(())
            }
            PlaybackState::Paused => {
                self.engine
                    .set_property("pause", PropertyValue::Flag(false))
                    .await?;
                self.set_state(PlaybackState::Playing);
                Ok(())
            }
        }
    }

    async fn pause(&mut self) -> Result<(), PlayerError> {
        match self.state {
            PlaybackState::Playing => {
                self.engine
                    .set_property("pause", PropertyValue::Flag(true))
                    .await?;
                self.set_state(PlaybackState::Paused);
                Ok(())
            }
            // Nothing to pause.
            _ => Ok(()),
        }
    }

    async fn toggle(&mut self) -> Result<(), PlayerError> {
        match self.state {
            PlaybackState::Starting => Ok(()),
            PlaybackState::Playing => self.pause().await,
            PlaybackState::Stopped | PlaybackState::Paused => self.play().await,
        }
    }

    /// Stop playback and clear the playlist.
    ///
    /// The state moves to Stopped before the engine is touched and stays
    /// there even if the engine commands fail; a half-failed stop must
    /// never leave a stale playing state behind.
    async fn stop(&mut self) -> Result<(), PlayerError> {
        let prev = self.state;
        self.set_state(PlaybackState::Stopped);
        self.cursor = -1;

        if matches!(prev, PlaybackState::Starting | PlaybackState::Stopped) {
            return Ok(());
        }

        if let Err(e) = self.engine.command(&["playlist-clear"]).await {
            warn!("playlist-clear failed during stop: {e}");
        }
        if let Err(e) = self.engine.command(&["playlist-remove", "current"]).await {
            warn!("playlist-remove failed during stop: {e}");
        }

        self.send_signal(PlayerSignal::TrackChanged);
        Ok(())
    }

    async fn seek(&mut self, seconds: i64) -> Result<(), PlayerError> {
        self.engine
            .command(&["seek", &seconds.to_string()])
            .await
            .map_err(Into::into)
    }

    /// Forced: always advances, even past the last entry (the resulting
    /// idle event triggers random continuation).
    async fn next(&mut self) -> Result<(), PlayerError> {
        self.engine
            .command(&["playlist-next", "force"])
            .await
            .map_err(Into::into)
    }

    /// Weak: a no-op at the first entry, deliberately asymmetric to
    /// `next`.
    async fn prev(&mut self) -> Result<(), PlayerError> {
        self.engine
            .command(&["playlist-prev", "weak"])
            .await
            .map_err(Into::into)
    }

    async fn goto(&mut self, index: i64) -> Result<(), PlayerError> {
        self.engine
            .set_property("playlist-pos", PropertyValue::Int(index))
            .await
            .map_err(|e| {
                debug!("goto {index} rejected: {e}");
                PlayerError::InvalidIndex(index)
            })?;

        self.cursor = self.playlist_position().await;
        Ok(())
    }

    async fn append_track(&mut self, path: String, play: bool) -> Result<(), PlayerError> {
        let path = if path.is_empty() {
            match self.library.pick_random().await {
                Ok(Some(path)) => path,
                Ok(None) => return Err(PlayerError::NoTrackAvailable),
                Err(e) => {
                    warn!("library pick failed: {e}");
                    return Err(PlayerError::NoTrackAvailable);
                }
            }
        } else {
            path
        };

        let mode = if play { "append-play" } else { "append" };
        self.engine.command(&["loadfile", &path, mode]).await?;

        if play {
            self.cursor = self.playlist_position().await;
        }

        Ok(())
    }

    async fn append_list(&mut self, path: &str) -> Result<(), PlayerError> {
        self.engine
            .command(&["loadlist", path, "append"])
            .await
            .map_err(Into::into)
    }

    async fn remove(&mut self, index: i64) -> Result<(), PlayerError> {
        let arg = if index == -1 {
            "current".to_string()
        } else {
            index.to_string()
        };

        self.engine
            .command(&["playlist-remove", &arg])
            .await
            .map_err(|e| {
                if index >= 0 {
                    debug!("remove {index} rejected: {e}");
                    PlayerError::InvalidIndex(index)
                } else {
                    PlayerError::Engine(e)
                }
            })?;

        self.cursor = self.playlist_position().await;
        Ok(())
    }

    /// The two engine loop flags are cleared before one is set, so they
    /// can never disagree.
    async fn set_loop(&mut self, mode: LoopMode) -> Result<(), PlayerError> {
        self.engine
            .set_property("loop-file", PropertyValue::from("no"))
            .await?;
        self.engine
            .set_property("loop-playlist", PropertyValue::from("no"))
            .await?;

        match mode {
            LoopMode::None => {}
            LoopMode::Track => {
                self.engine
                    .set_property("loop-file", PropertyValue::from("inf"))
                    .await?;
            }
            LoopMode::List => {
                self.engine
                    .set_property("loop-playlist", PropertyValue::from("inf"))
                    .await?;
            }
        }

        self.loop_mode = mode;
        Ok(())
    }

    /// The previous filter is removed before the new one is added, so
    /// replaygain filters never stack.
    async fn set_replaygain(&mut self, mode: ReplaygainMode) -> Result<(), PlayerError> {
        // Removing a label that is not in the chain is not worth surfacing.
        if let Err(e) = self
            .engine
            .command(&["af", "remove", REPLAYGAIN_FILTER_LABEL])
            .await
        {
            debug!("replaygain filter removal: {e}");
        }

        if mode != ReplaygainMode::None {
            let filter = format!("{REPLAYGAIN_FILTER_LABEL}:volume=replaygain-{mode}");
            self.engine.command(&["af", "add", &filter]).await?;
        }

        self.replaygain = mode;
        Ok(())
    }

    async fn status(&self) -> PlayerStatus {
        PlayerStatus {
            state: self.state,
            path: self.property_string("path").await,
            length: self.property_double("duration").await,
            position: self.property_double("time-pos").await,
            percent: self.property_double("percent-pos").await,
            metadata: self.metadata().await,
            loop_mode: self.loop_mode,
            replaygain: self.replaygain,
        }
    }

    async fn playlist(&self) -> PlaylistSnapshot {
        let tracks = match self.engine.get_property("playlist").await {
            Ok(PropertyValue::List(entries)) => entries
                .into_iter()
                .filter_map(|entry| {
                    let PropertyValue::Map(map) = entry else {
                        return None;
                    };
                    map.get("filename")
                        .and_then(|v| v.as_str())
                        .map(ToString::to_string)
                })
                .collect(),
            _ => Vec::new(),
        };

        PlaylistSnapshot {
            count: self.playlist_count().await,
            position: self.cursor,
            tracks,
        }
    }

    async fn quit(&mut self) -> Result<(), PlayerError> {
        self.engine.command(&["quit"]).await.map_err(Into::into)
    }

    async fn notify_now_playing(&self) {
        let Some(notifier) = self.notifier.clone() else {
            return;
        };

        let title = self.display_title().await;
        tokio::spawn(async move {
            if let Err(e) = notifier
                .notify("Now Playing", &title, "media-playback-start")
                .await
            {
                warn!("notification failed: {e}");
            }
        });
    }

    async fn display_title(&self) -> String {
        let title = self.property_string("media-title").await;
        let metadata = self.metadata().await;

        match metadata.get("artist") {
            Some(artist) if !artist.is_empty() => format!("{artist} - {title}"),
            _ => title,
        }
    }

    async fn metadata(&self) -> HashMap<String, String> {
        let Ok(PropertyValue::Map(entries)) = self.engine.get_property("metadata").await else {
            return HashMap::new();
        };

        entries
            .into_iter()
            .filter_map(|(key, value)| value.as_str().map(|s| (key, s.to_string())))
            .collect()
    }

    async fn playlist_count(&self) -> i64 {
        self.engine
            .get_property("playlist-count")
            .await
            .ok()
            .and_then(|v| v.as_int())
            .unwrap_or(0)
    }

    async fn playlist_position(&self) -> i64 {
        self.engine
            .get_property("playlist-pos")
            .await
            .ok()
            .and_then(|v| v.as_int())
            .unwrap_or(-1)
    }

    async fn property_double(&self, name: &str) -> f64 {
        self.engine
            .get_property(name)
            .await
            .ok()
            .and_then(|v| v.as_double())
            .unwrap_or(0.0)
    }

    async fn property_string(&self, name: &str) -> String {
        self.engine
            .get_property(name)
            .await
            .ok()
            .and_then(|v| v.as_str().map(ToString::to_string))
            .unwrap_or_default()
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.state == state {
            return;
        }
        self.state = state;
        self.send_signal(PlayerSignal::StatusChanged(state));
    }

    fn send_signal(&self, signal: PlayerSignal) {
        // No subscribers is fine; the bus layer may not be up yet.
        let _ = self.signals.send(signal);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::sync::broadcast::error::TryRecvError;

    use super::*;
    use crate::engine::EngineError;
    use crate::library::{LibraryError, NoLibrary};

    /// Scripted engine emulating just enough of the playlist and
    /// property model for state machine tests.
    #[derive(Clone, Default)]
    struct FakeEngine {
        inner: Arc<Mutex<FakeState>>,
    }

    #[derive(Default)]
    struct FakeState {
        playlist: Vec<String>,
        position: i64,
        properties: HashMap<String, PropertyValue>,
        filters: Vec<String>,
        commands: Vec<Vec<String>>,
        fail: HashSet<String>,
    }

    impl FakeEngine {
        fn with_playlist(tracks: &[&str], position: i64) -> Self {
            let engine = Self::default();
            {
                let mut state = engine.inner.lock().unwrap();
                state.playlist = tracks.iter().map(ToString::to_string).collect();
                state.position = position;
            }
            engine
        }

        fn fail_on(&self, name: &str) {
            self.inner.lock().unwrap().fail.insert(name.to_string());
        }

        fn position(&self) -> i64 {
            self.inner.lock().unwrap().position
        }

        fn playlist(&self) -> Vec<String> {
            self.inner.lock().unwrap().playlist.clone()
        }

        fn filters(&self) -> Vec<String> {
            self.inner.lock().unwrap().filters.clone()
        }

        fn property(&self, name: &str) -> Option<PropertyValue> {
            self.inner.lock().unwrap().properties.get(name).cloned()
        }

        fn commands(&self) -> Vec<Vec<String>> {
            self.inner.lock().unwrap().commands.clone()
        }
    }

    #[async_trait]
    impl Engine for FakeEngine {
        async fn command(&self, args: &[&str]) -> Result<(), EngineError> {
            let mut state = self.inner.lock().unwrap();
            state
                .commands
                .push(args.iter().map(ToString::to_string).collect());

            if state.fail.contains(args[0]) {
                return Err(EngineError::Command(format!("{} forced to fail", args[0])));
            }

            match args {
                ["loadfile", path, mode] => {
                    state.playlist.push((*path).to_string());
                    if *mode == "append-play" && state.position < 0 {
                        state.position = state.playlist.len() as i64 - 1;
                    }
                }
                ["playlist-remove", "current"] => {
                    let pos = state.position;
                    if pos < 0 {
                        return Err(EngineError::Command("no current entry".to_string()));
                    }
                    state.playlist.remove(pos as usize);
                    state.position = -1;
                }
                ["playlist-remove", index] => {
                    let index: i64 = index
                        .parse()
                        .map_err(|_| EngineError::Command("bad index".to_string()))?;
                    if index < 0 || index as usize >= state.playlist.len() {
                        return Err(EngineError::Command("index out of range".to_string()));
                    }
                    state.playlist.remove(index as usize);
                    if index == state.position {
                        state.position = -1;
                    } else if index < state.position {
                        state.position -= 1;
                    }
                }
                ["playlist-clear"] => {
                    let pos = state.position;
                    if pos >= 0 {
                        let current = state.playlist[pos as usize].clone();
                        state.playlist = vec![current];
                        state.position = 0;
                    } else {
                        state.playlist.clear();
                    }
                }
                ["playlist-next", "force"] => {
                    if state.position + 1 < state.playlist.len() as i64 {
                        state.position += 1;
                    } else {
                        // Forced past the end: playback stops.
                        state.position = -1;
                    }
                }
                ["playlist-prev", "weak"] => {
                    if state.position > 0 {
                        state.position -= 1;
                    }
                }
                ["af", "remove", label] => {
                    state.filters.retain(|f| !f.starts_with(*label));
                }
                ["af", "add", filter] => {
                    state.filters.push((*filter).to_string());
                }
                _ => {}
            }

            Ok(())
        }

        async fn get_property(&self, name: &str) -> Result<PropertyValue, EngineError> {
            let state = self.inner.lock().unwrap();
            match name {
                "playlist-count" => Ok(PropertyValue::Int(state.playlist.len() as i64)),
                "playlist-pos" => Ok(PropertyValue::Int(state.position)),
                "playlist" => Ok(PropertyValue::List(
                    state
                        .playlist
                        .iter()
                        .map(|path| {
                            PropertyValue::Map(HashMap::from([(
                                "filename".to_string(),
                                PropertyValue::Str(path.clone()),
                            )]))
                        })
                        .collect(),
                )),
                other => state
                    .properties
                    .get(other)
                    .cloned()
                    .ok_or_else(|| EngineError::Command("property unavailable".to_string())),
            }
        }

        async fn set_property(&self, name: &str, value: PropertyValue) -> Result<(), EngineError> {
            let mut state = self.inner.lock().unwrap();

            if state.fail.contains(name) {
                return Err(EngineError::Command(format!("{name} forced to fail")));
            }

            if name == "playlist-pos" {
                let index = value.as_int().unwrap_or(-1);
                if index < 0 || index as usize >= state.playlist.len() {
                    return Err(EngineError::Command("index out of range".to_string()));
                }
                state.position = index;
                return Ok(());
            }

            state.properties.insert(name.to_string(), value);
            Ok(())
        }
    }

    struct OneTrackLibrary(&'static str);

    #[async_trait]
    impl MediaLibrary for OneTrackLibrary {
        async fn pick_random(&self) -> Result<Option<String>, LibraryError> {
            Ok(Some(self.0.to_string()))
        }
    }

    fn test_core(
        engine: FakeEngine,
        library: Arc<dyn MediaLibrary>,
        state: PlaybackState,
    ) -> (PlayerCore<FakeEngine>, broadcast::Receiver<PlayerSignal>) {
        let (_events_tx, events_rx) = mpsc::channel(8);
        let (_requests_tx, requests_rx) = mpsc::channel(8);
        let (signals_tx, signals_rx) = broadcast::channel(16);

        // The request/event channels stay unused: unit tests drive the
        // handlers directly.
        std::mem::forget(_events_tx);
        std::mem::forget(_requests_tx);

        let core = PlayerCore {
            engine,
            events: events_rx,
            requests: requests_rx,
            requests_open: true,
            signals: signals_tx,
            library,
            notifier: None,
            state,
            cursor: -1,
            loop_mode: LoopMode::default(),
            replaygain: ReplaygainMode::default(),
        };

        (core, signals_rx)
    }

    fn drain(rx: &mut broadcast::Receiver<PlayerSignal>) -> Vec<PlayerSignal> {
        let mut signals = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(signal) => signals.push(signal),
                Err(TryRecvError::Empty | TryRecvError::Closed) => return signals,
                Err(TryRecvError::Lagged(_)) => continue,
            }
        }
    }

    #[tokio::test]
    async fn startup_idle_settles_without_notification() {
        let engine = FakeEngine::default();
        let (mut core, mut signals) =
            test_core(engine, Arc::new(NoLibrary), PlaybackState::Starting);

        core.handle_event(EngineEvent::Idle).await;

        assert_eq!(core.state, PlaybackState::Stopped);
        assert!(drain(&mut signals).is_empty());
    }

    #[tokio::test]
    async fn play_with_empty_playlist_pulls_random_track() {
        let engine = FakeEngine::default();
        let (mut core, mut signals) = test_core(
            engine.clone(),
            Arc::new(OneTrackLibrary("/music/a.mp3")),
            PlaybackState::Stopped,
        );

        core.play().await.unwrap();

        assert_eq!(core.state, PlaybackState::Playing);
        assert_eq!(core.cursor, 0);
        assert_eq!(engine.playlist(), vec!["/music/a.mp3".to_string()]);
        assert_eq!(
            drain(&mut signals),
            vec![PlayerSignal::StatusChanged(PlaybackState::Playing)]
        );
    }

    #[tokio::test]
    async fn play_with_empty_playlist_and_empty_library_fails() {
        let engine = FakeEngine::default();
        let (mut core, mut signals) =
            test_core(engine, Arc::new(NoLibrary), PlaybackState::Stopped);

        let result = core.play().await;

        assert!(matches!(result, Err(PlayerError::NoTrackAvailable)));
        assert_eq!(core.state, PlaybackState::Stopped);
        assert!(drain(&mut signals).is_empty());
    }

    #[tokio::test]
    async fn play_with_queued_tracks_jumps_to_first() {
        let engine = FakeEngine::with_playlist(&["/a.mp3", "/b.mp3"], -1);
        let (mut core, _signals) = test_core(
            engine.clone(),
            Arc::new(NoLibrary),
            PlaybackState::Stopped,
        );

        core.play().await.unwrap();

        assert_eq!(core.state, PlaybackState::Playing);
        assert_eq!(core.cursor, 0);
        assert_eq!(engine.position(), 0);
    }

    #[tokio::test]
    async fn play_while_playing_is_a_noop() {
        let engine = FakeEngine::with_playlist(&["/a.mp3"], 0);
        let (mut core, mut signals) = test_core(
            engine.clone(),
            Arc::new(NoLibrary),
            PlaybackState::Playing,
        );

        core.play().await.unwrap();

        assert_eq!(core.state, PlaybackState::Playing);
        assert!(engine.commands().is_empty());
        assert!(drain(&mut signals).is_empty());
    }

    #[tokio::test]
    async fn pause_maps_to_engine_property() {
        let engine = FakeEngine::with_playlist(&["/a.mp3"], 0);
        let (mut core, mut signals) = test_core(
            engine.clone(),
            Arc::new(NoLibrary),
            PlaybackState::Playing,
        );

        core.pause().await.unwrap();

        assert_eq!(core.state, PlaybackState::Paused);
        assert_eq!(
            engine.property("pause").and_then(|v| v.as_flag()),
            Some(true)
        );
        assert_eq!(
            drain(&mut signals),
            vec![PlayerSignal::StatusChanged(PlaybackState::Paused)]
        );
    }

    #[tokio::test]
    async fn pause_from_stopped_is_a_noop() {
        let engine = FakeEngine::default();
        let (mut core, mut signals) = test_core(
            engine.clone(),
            Arc::new(NoLibrary),
            PlaybackState::Stopped,
        );

        core.pause().await.unwrap();

        assert_eq!(core.state, PlaybackState::Stopped);
        assert!(engine.commands().is_empty());
        assert!(drain(&mut signals).is_empty());
    }

    #[tokio::test]
    async fn toggle_dispatches_on_current_state() {
        let engine = FakeEngine::with_playlist(&["/a.mp3"], 0);
        let (mut core, _signals) = test_core(
            engine.clone(),
            Arc::new(NoLibrary),
            PlaybackState::Playing,
        );

        core.toggle().await.unwrap();
        assert_eq!(core.state, PlaybackState::Paused);

        core.toggle().await.unwrap();
        assert_eq!(core.state, PlaybackState::Playing);
    }

    #[tokio::test]
    async fn stop_forces_stopped_state_even_when_engine_fails() {
        let engine = FakeEngine::with_playlist(&["/a.mp3", "/b.mp3"], 1);
        engine.fail_on("playlist-clear");
        engine.fail_on("playlist-remove");

        let (mut core, mut signals) = test_core(
            engine,
            Arc::new(NoLibrary),
            PlaybackState::Playing,
        );
        core.cursor = 1;

        core.stop().await.unwrap();

        assert_eq!(core.state, PlaybackState::Stopped);
        assert_eq!(core.cursor, -1);

        let signals = drain(&mut signals);
        assert!(signals.contains(&PlayerSignal::StatusChanged(PlaybackState::Stopped)));
        assert!(signals.contains(&PlayerSignal::TrackChanged));
    }

    #[tokio::test]
    async fn stop_clears_the_playlist() {
        let engine = FakeEngine::with_playlist(&["/a.mp3", "/b.mp3", "/c.mp3"], 1);
        let (mut core, _signals) = test_core(
            engine.clone(),
            Arc::new(NoLibrary),
            PlaybackState::Playing,
        );
        core.cursor = 1;

        core.stop().await.unwrap();

        assert!(engine.playlist().is_empty());
        assert_eq!(core.cursor, -1);
    }

    #[tokio::test]
    async fn loop_flags_stay_mutually_exclusive() {
        let engine = FakeEngine::default();
        let (mut core, _signals) = test_core(
            engine.clone(),
            Arc::new(NoLibrary),
            PlaybackState::Stopped,
        );

        let modes = [LoopMode::None, LoopMode::Track, LoopMode::List];
        for prior in modes {
            for mode in modes {
                core.set_loop(prior).await.unwrap();
                core.set_loop(mode).await.unwrap();

                let file = engine.property("loop-file").and_then(|v| match v {
                    PropertyValue::Str(s) => Some(s),
                    _ => None,
                });
                let list = engine.property("loop-playlist").and_then(|v| match v {
                    PropertyValue::Str(s) => Some(s),
                    _ => None,
                });

                match mode {
                    LoopMode::None => {
                        assert_eq!(file.as_deref(), Some("no"));
                        assert_eq!(list.as_deref(), Some("no"));
                    }
                    LoopMode::Track => {
                        assert_eq!(file.as_deref(), Some("inf"));
                        assert_eq!(list.as_deref(), Some("no"));
                    }
                    LoopMode::List => {
                        assert_eq!(file.as_deref(), Some("no"));
                        assert_eq!(list.as_deref(), Some("inf"));
                    }
                }
                assert_eq!(core.loop_mode, mode);
            }
        }
    }

    #[tokio::test]
    async fn replaygain_filters_never_stack() {
        let engine = FakeEngine::default();
        let (mut core, _signals) = test_core(
            engine.clone(),
            Arc::new(NoLibrary),
            PlaybackState::Stopped,
        );

        core.set_replaygain(ReplaygainMode::Album).await.unwrap();
        core.set_replaygain(ReplaygainMode::Track).await.unwrap();

        assert_eq!(
            engine.filters(),
            vec!["@replaygain:volume=replaygain-track".to_string()]
        );

        core.set_replaygain(ReplaygainMode::None).await.unwrap();
        assert!(engine.filters().is_empty());
    }

    #[tokio::test]
    async fn prev_at_first_entry_stays_put() {
        let engine = FakeEngine::with_playlist(&["/a.mp3", "/b.mp3"], 0);
        let (mut core, _signals) = test_core(
            engine.clone(),
            Arc::new(NoLibrary),
            PlaybackState::Playing,
        );

        core.prev().await.unwrap();

        assert_eq!(engine.position(), 0);
    }

    #[tokio::test]
    async fn forced_next_at_last_entry_triggers_random_continuation() {
        let engine = FakeEngine::with_playlist(&["/a.mp3"], 0);
        let (mut core, _signals) = test_core(
            engine.clone(),
            Arc::new(OneTrackLibrary("/music/fresh.mp3")),
            PlaybackState::Playing,
        );
        core.cursor = 0;

        core.next().await.unwrap();
        // Engine ran out and reports idle; the pump continues playback.
        core.handle_event(EngineEvent::Idle).await;

        assert_eq!(core.state, PlaybackState::Playing);
        assert_eq!(
            engine.playlist(),
            vec!["/a.mp3".to_string(), "/music/fresh.mp3".to_string()]
        );
        assert_eq!(core.cursor, 1);
    }

    #[tokio::test]
    async fn idle_with_empty_library_stops_playback() {
        let engine = FakeEngine::with_playlist(&["/a.mp3"], 0);
        let (mut core, mut signals) = test_core(
            engine,
            Arc::new(NoLibrary),
            PlaybackState::Playing,
        );
        core.cursor = 0;

        core.handle_event(EngineEvent::Idle).await;

        assert_eq!(core.state, PlaybackState::Stopped);
        assert_eq!(core.cursor, -1);

        let signals = drain(&mut signals);
        assert!(signals.contains(&PlayerSignal::StatusChanged(PlaybackState::Stopped)));
        assert!(signals.contains(&PlayerSignal::TrackChanged));
    }

    #[tokio::test]
    async fn remove_current_resyncs_cursor_from_engine() {
        let engine = FakeEngine::with_playlist(&["/a.mp3", "/b.mp3"], 1);
        let (mut core, _signals) = test_core(
            engine.clone(),
            Arc::new(NoLibrary),
            PlaybackState::Playing,
        );
        core.cursor = 1;

        core.remove(-1).await.unwrap();

        assert_eq!(engine.playlist(), vec!["/a.mp3".to_string()]);
        assert_eq!(core.cursor, engine.position());
    }

    #[tokio::test]
    async fn goto_out_of_range_is_invalid_index() {
        let engine = FakeEngine::with_playlist(&["/a.mp3"], 0);
        let (mut core, _signals) = test_core(
            engine,
            Arc::new(NoLibrary),
            PlaybackState::Playing,
        );

        let result = core.goto(5).await;

        assert!(matches!(result, Err(PlayerError::InvalidIndex(5))));
    }

    #[tokio::test]
    async fn redundant_state_events_emit_nothing() {
        let engine = FakeEngine::with_playlist(&["/a.mp3"], 0);
        let (mut core, mut signals) = test_core(
            engine,
            Arc::new(NoLibrary),
            PlaybackState::Playing,
        );

        core.handle_event(EngineEvent::Pause).await;
        core.handle_event(EngineEvent::Pause).await;

        assert_eq!(
            drain(&mut signals),
            vec![PlayerSignal::StatusChanged(PlaybackState::Paused)]
        );
    }

    #[tokio::test]
    async fn start_file_recaches_cursor_and_announces_track() {
        let engine = FakeEngine::with_playlist(&["/a.mp3", "/b.mp3"], 1);
        let (mut core, mut signals) = test_core(
            engine,
            Arc::new(NoLibrary),
            PlaybackState::Playing,
        );
        core.cursor = 0;

        core.handle_event(EngineEvent::StartFile).await;

        assert_eq!(core.cursor, 1);
        assert_eq!(drain(&mut signals), vec![PlayerSignal::TrackChanged]);
    }

    #[tokio::test]
    async fn unknown_events_are_ignored() {
        let engine = FakeEngine::default();
        let (mut core, mut signals) = test_core(
            engine,
            Arc::new(NoLibrary),
            PlaybackState::Playing,
        );

        core.handle_event(EngineEvent::Other("file-loaded".to_string()))
            .await;

        assert_eq!(core.state, PlaybackState::Playing);
        assert!(drain(&mut signals).is_empty());
    }

    #[tokio::test]
    async fn status_snapshot_reflects_engine_properties() {
        let engine = FakeEngine::with_playlist(&["/a.mp3"], 0);
        {
            let mut state = engine.inner.lock().unwrap();
            state
                .properties
                .insert("path".to_string(), PropertyValue::from("/a.mp3"));
            state
                .properties
                .insert("duration".to_string(), PropertyValue::Double(180.0));
            state
                .properties
                .insert("time-pos".to_string(), PropertyValue::Double(45.0));
            state
                .properties
                .insert("percent-pos".to_string(), PropertyValue::Double(25.0));
            state.properties.insert(
                "metadata".to_string(),
                PropertyValue::Map(HashMap::from([
                    ("title".to_string(), PropertyValue::from("A Song")),
                    ("artist".to_string(), PropertyValue::from("Someone")),
                ])),
            );
        }

        let (mut core, _signals) = test_core(
            engine,
            Arc::new(NoLibrary),
            PlaybackState::Playing,
        );
        core.cursor = 0;

        let status = core.status().await;

        assert_eq!(status.state, PlaybackState::Playing);
        assert_eq!(status.path, "/a.mp3");
        assert_eq!(status.length, 180.0);
        assert_eq!(status.position, 45.0);
        assert_eq!(status.percent, 25.0);
        assert_eq!(status.metadata.get("artist").map(String::as_str), Some("Someone"));

        let snapshot = core.playlist().await;
        assert_eq!(snapshot.tracks, vec!["/a.mp3".to_string()]);
        assert_eq!(snapshot.count, 1);
        assert_eq!(snapshot.position, 0);
    }
}
