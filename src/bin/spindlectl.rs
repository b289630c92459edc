//! spindlectl: command line control for the spindle daemon.

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use spindle::bus::PlayerProxy;
use spindle::{Result, SpindleError, tracing_config};

#[derive(Parser)]
#[command(name = "spindlectl", about = "Control the music player daemon", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start or resume playback
    Play,
    /// Pause playback
    Pause,
    /// Toggle between play and pause
    Toggle,
    /// Stop playback and clear the playlist
    Stop,
    /// Skip to the next track
    Next,
    /// Go back to the previous track
    Prev,
    /// Seek by a relative number of seconds
    Seek {
        seconds: i64,
    },
    /// Jump to a playlist index
    Goto {
        index: i64,
    },
    /// Add a track to the playlist
    Add {
        path: String,
    },
    /// Append a playlist file
    Load {
        path: String,
    },
    /// Remove a playlist entry by index
    Rm {
        index: i64,
    },
    /// Set the loop mode (none, track, list)
    Loop {
        mode: String,
    },
    /// Set the replaygain mode (none, track, album)
    Replaygain {
        mode: String,
    },
    /// Show the player status
    Status,
    /// Show the playlist
    Playlist,
    /// Shut the daemon down
    Quit,
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn Error>> {
    tracing_config::init_cli_mode()?;

    let cli = Cli::parse();

    let connection = zbus::Connection::session().await?;
    let player = PlayerProxy::new(&connection).await?;

    match cli.command {
        Command::Play => player.play().await?,
        Command::Pause => player.pause().await?,
        Command::Toggle => player.toggle().await?,
        Command::Stop => player.stop().await?,
        Command::Next => player.next().await?,
        Command::Prev => player.prev().await?,
        Command::Seek { seconds } => player.seek(seconds).await?,
        Command::Goto { index } => player.goto_track(index).await?,
        Command::Add { path } => player.add_track(&resolve_track(&path)?).await?,
        Command::Load { path } => player.add_list(&resolve_track(&path)?).await?,
        Command::Rm { index } => player.remove_track(index).await?,
        Command::Loop { mode } => player.set_loop(&mode).await?,
        Command::Replaygain { mode } => player.set_replaygain(&mode).await?,
        Command::Status => print_status(&player).await?,
        Command::Playlist => print_playlist(&player).await?,
        Command::Quit => player.quit().await?,
    }

    Ok(())
}

/// Local files become absolute paths so the daemon resolves them from
/// its own working directory; anything else (URLs) passes through.
fn resolve_track(path: &str) -> Result<String> {
    let candidate = PathBuf::from(path);
    if !candidate.exists() {
        return Ok(path.to_string());
    }

    let absolute = candidate.canonicalize()?;
    absolute
        .into_os_string()
        .into_string()
        .map_err(|_| SpindleError::Config(format!("path is not valid unicode: {path}")))
}

async fn print_status(player: &PlayerProxy<'_>) -> Result<()> {
    let (state, path, length, position, percent, metadata, loop_mode, replaygain) =
        player.status().await?;

    println!("state: {state}");

    if !path.is_empty() {
        if let Some(artist) = metadata.get("artist") {
            println!("artist: {artist}");
        }
        if let Some(title) = metadata.get("title") {
            println!("title: {title}");
        }
        if let Some(album) = metadata.get("album") {
            println!("album: {album}");
        }

        println!("path: {path}");
        println!(
            "time: {} / {} ({percent:.0}%)",
            format_time(position),
            format_time(length)
        );
    }

    println!("loop: {loop_mode}");
    println!("replaygain: {replaygain}");

    Ok(())
}

async fn print_playlist(player: &PlayerProxy<'_>) -> Result<()> {
    let (tracks, count, position) = player.playlist().await?;

    for (index, track) in tracks.iter().enumerate() {
        let marker = if index as i64 == position { "*" } else { " " };
        println!("{marker} {index}: {track}");
    }

    println!("total: {count}");

    Ok(())
}

fn format_time(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
