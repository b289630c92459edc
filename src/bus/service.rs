use std::collections::HashMap;

use tracing::{debug, info, warn};
use zbus::object_server::SignalEmitter;
use zbus::{connection, fdo, interface};

use super::{BUS_NAME, OBJECT_PATH};
use crate::player::{PlayerError, PlayerHandle, PlayerSignal};

/// Serve the player on the session bus.
///
/// Claims [`BUS_NAME`], exports the interface at [`OBJECT_PATH`] and
/// spawns a forwarder task that turns player signals into D-Bus signals.
/// The returned connection must be kept alive for the daemon's lifetime.
pub async fn serve(player: PlayerHandle) -> zbus::Result<zbus::Connection> {
    let mut signals = player.subscribe();

    let connection = connection::Builder::session()?
        .name(BUS_NAME)?
        .serve_at(OBJECT_PATH, PlayerInterface { player })?
        .build()
        .await?;

    info!("serving {} at {}", BUS_NAME, OBJECT_PATH);

    let iface = connection
        .object_server()
        .interface::<_, PlayerInterface>(OBJECT_PATH)
        .await?;

    tokio::spawn(async move {
        loop {
            let signal = match signals.recv().await {
                Ok(signal) => signal,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    warn!("dropped {n} player signals");
                    continue;
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            };

            let emitter = iface.signal_emitter();
            let result = match signal {
                PlayerSignal::StatusChanged(state) => {
                    PlayerInterface::status_changed(emitter, &state.to_string()).await
                }
                PlayerSignal::TrackChanged => PlayerInterface::track_changed(emitter).await,
            };

            if let Err(e) = result {
                debug!("could not emit bus signal: {e}");
            }
        }
    });

    Ok(connection)
}

struct PlayerInterface {
    player: PlayerHandle,
}

fn into_fdo(err: PlayerError) -> fdo::Error {
    match err {
        PlayerError::InvalidIndex(_) | PlayerError::InvalidMode(_) => {
            fdo::Error::InvalidArgs(err.to_string())
        }
        other => fdo::Error::Failed(other.to_string()),
    }
}

#[interface(name = "io.spindle.Player1")]
impl PlayerInterface {
    async fn play(&self) -> fdo::Result<()> {
        self.player.play().await.map_err(into_fdo)
    }

    async fn pause(&self) -> fdo::Result<()> {
        self.player.pause().await.map_err(into_fdo)
    }

    async fn toggle(&self) -> fdo::Result<()> {
        self.player.toggle().await.map_err(into_fdo)
    }

    async fn stop(&self) -> fdo::Result<()> {
        self.player.stop().await.map_err(into_fdo)
    }

    async fn seek(&self, seconds: i64) -> fdo::Result<()> {
        self.player.seek(seconds).await.map_err(into_fdo)
    }

    async fn next(&self) -> fdo::Result<()> {
        self.player.next().await.map_err(into_fdo)
    }

    async fn prev(&self) -> fdo::Result<()> {
        self.player.prev().await.map_err(into_fdo)
    }

    async fn goto_track(&self, index: i64) -> fdo::Result<()> {
        self.player.goto_index(index).await.map_err(into_fdo)
    }

    /// Appends only; playback starts on an explicit Play.
    async fn add_track(&self, path: String) -> fdo::Result<()> {
        self.player
            .append_track(path, false)
            .await
            .map_err(into_fdo)
    }

    async fn add_list(&self, path: String) -> fdo::Result<()> {
        self.player.append_list(path).await.map_err(into_fdo)
    }

    async fn remove_track(&self, index: i64) -> fdo::Result<()> {
        self.player.remove_track(index).await.map_err(into_fdo)
    }

    /// Mode strings are validated here; unknown ones never reach the core.
    async fn set_loop(&self, mode: String) -> fdo::Result<()> {
        let mode = mode.parse().map_err(into_fdo)?;
        self.player.set_loop(mode).await.map_err(into_fdo)
    }

    async fn set_replaygain(&self, mode: String) -> fdo::Result<()> {
        let mode = mode.parse().map_err(into_fdo)?;
        self.player.set_replaygain(mode).await.map_err(into_fdo)
    }

    #[allow(clippy::type_complexity)]
    async fn status(
        &self,
    ) -> fdo::Result<(
        String,
        String,
        f64,
        f64,
        f64,
        HashMap<String, String>,
        String,
        String,
    )> {
        let status = self.player.status().await.map_err(into_fdo)?;

        Ok((
            status.state.to_string(),
            status.path,
            status.length,
            status.position,
            status.percent,
            status.metadata,
            status.loop_mode.to_string(),
            status.replaygain.to_string(),
        ))
    }

    async fn playlist(&self) -> fdo::Result<(Vec<String>, i64, i64)> {
        let snapshot = self.player.playlist().await.map_err(into_fdo)?;
        Ok((snapshot.tracks, snapshot.count, snapshot.position))
    }

    async fn quit(&self) -> fdo::Result<()> {
        self.player.quit().await.map_err(into_fdo)
    }

    /// Playback state changed; carries the new state label.
    #[zbus(signal)]
    async fn status_changed(emitter: &SignalEmitter<'_>, state: &str) -> zbus::Result<()>;

    /// Current track or its metadata changed.
    #[zbus(signal)]
    async fn track_changed(emitter: &SignalEmitter<'_>) -> zbus::Result<()>;
}
