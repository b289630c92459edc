//! spindled: the music player daemon.
//!
//! Wires the pieces together: spawns the playback engine, opens the
//! media library, starts the player core and serves it on the session
//! bus until interrupted or told to quit.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};

use spindle::config::{Config, ConfigPaths};
use spindle::engine::MpvEngine;
use spindle::library::{MediaLibrary, NoLibrary, SqliteLibrary};
use spindle::notify::Notifier;
use spindle::player::PlayerCore;
use spindle::{bus, tracing_config};

#[derive(Parser)]
#[command(name = "spindled", about = "Music player daemon", version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    tracing_config::init(cli.verbose)?;

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    let socket = ConfigPaths::engine_socket();
    let (engine, events) = MpvEngine::spawn(&config.player, &socket).await?;
    info!("engine ready on {}", socket.display());

    let library: Arc<dyn MediaLibrary> = match &config.library.path {
        Some(path) => Arc::new(SqliteLibrary::open(path).await?),
        None => {
            info!("no media library configured, random continuation disabled");
            Arc::new(NoLibrary)
        }
    };

    let notifier = if config.notifications.enabled {
        match notifier().await {
            Ok(notifier) => Some(notifier),
            Err(e) => {
                warn!("notifications unavailable: {e}");
                None
            }
        }
    } else {
        None
    };

    let (player, mut task) = PlayerCore::spawn(engine, events, library, notifier);

    if let Some(mode) = config.player.replaygain {
        if let Err(e) = player.set_replaygain(mode).await {
            warn!("could not apply configured replaygain mode: {e}");
        }
    }

    let _connection = bus::serve(player.clone()).await?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, shutting down");
            if let Err(e) = player.quit().await {
                warn!("engine quit failed: {e}");
            }
            if let Err(e) = (&mut task).await {
                error!("player task failed during shutdown: {e}");
            }
        }
        result = &mut task => {
            if let Err(e) = result {
                error!("player task failed: {e}");
            }
        }
    }

    Ok(())
}

async fn notifier() -> zbus::Result<Notifier> {
    let connection = zbus::Connection::session().await?;
    Notifier::new(&connection).await
}
