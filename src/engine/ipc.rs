//! mpv adapter speaking the JSON IPC protocol over a unix socket.
//!
//! The daemon owns the mpv process: it is spawned idle with no video and
//! an `--input-ipc-server` socket, and terminated through the `quit`
//! command (which yields a `shutdown` event on the way out). A reader task
//! routes command replies to their waiters by request id and forwards
//! asynchronous events to the channel handed out at spawn time.

use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::{
    Mutex as StdMutex,
    atomic::{AtomicU64, Ordering},
};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, mpsc, oneshot};
use tracing::{debug, warn};

use super::{Engine, EngineError, EngineEvent, PropertyValue};
use crate::config::PlayerConfig;

/// How long to keep retrying the IPC socket while mpv starts up.
const CONNECT_ATTEMPTS: u32 = 50;
const CONNECT_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Buffered engine events between the reader task and the pump.
const EVENT_CHANNEL_CAPACITY: usize = 64;

struct Reply {
    error: String,
    data: Option<Value>,
}

type PendingMap = StdMutex<HashMap<u64, oneshot::Sender<Reply>>>;

/// Playback engine adapter for an mpv subprocess.
pub struct MpvEngine {
    writer: Mutex<OwnedWriteHalf>,
    pending: std::sync::Arc<PendingMap>,
    next_request: AtomicU64,
    // Held for kill-on-drop; the normal exit path is the quit command.
    _child: Child,
}

impl MpvEngine {
    /// Spawn mpv and connect to its IPC socket.
    ///
    /// Returns the adapter plus the receiving end of the engine event
    /// stream. Events stop (channel closes) if the engine process dies
    /// without a proper shutdown.
    ///
    /// # Errors
    /// Returns `EngineError::Spawn` if the process cannot be started or
    /// the socket never comes up; those are fatal at daemon startup.
    pub async fn spawn(
        config: &PlayerConfig,
        socket: &Path,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>), EngineError> {
        let child = Command::new("mpv")
            .args(Self::build_args(config, socket))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EngineError::Spawn(format!("could not execute mpv: {e}")))?;

        let stream = Self::connect(socket).await?;
        let (read_half, write_half) = stream.into_split();

        let pending = std::sync::Arc::new(PendingMap::default());
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        tokio::spawn(reader_loop(read_half, pending.clone(), events_tx));

        let engine = Self {
            writer: Mutex::new(write_half),
            pending,
            next_request: AtomicU64::new(1),
            _child: child,
        };

        // Route engine warnings and errors through our own logging.
        engine
            .request(vec![json!("request_log_messages"), json!("warn")])
            .await?;

        Ok((engine, events_rx))
    }

    fn build_args(config: &PlayerConfig, socket: &Path) -> Vec<String> {
        let mut args = vec![
            "--no-config".to_string(),
            "--idle=yes".to_string(),
            "--no-video".to_string(),
            "--no-terminal".to_string(),
            format!("--input-ipc-server={}", socket.display()),
            format!(
                "--gapless-audio={}",
                if config.gapless { "yes" } else { "no" }
            ),
        ];

        if let Some(output) = &config.output {
            args.push(format!("--ao={output}"));
        }

        if !config.filters.is_empty() {
            args.push(format!("--af={}", config.filters.join(",")));
        }

        if let Some(cache) = &config.cache {
            args.push(format!("--cache={cache}"));
        }

        for script in &config.scripts {
            args.push(format!("--script={}", script.display()));
        }

        args
    }

    async fn connect(socket: &Path) -> Result<UnixStream, EngineError> {
        for _ in 0..CONNECT_ATTEMPTS {
            match UnixStream::connect(socket).await {
                Ok(stream) => return Ok(stream),
                Err(_) => tokio::time::sleep(CONNECT_RETRY_DELAY).await,
            }
        }

        Err(EngineError::Spawn(format!(
            "engine IPC socket {} never came up",
            socket.display()
        )))
    }

    async fn request(&self, args: Vec<Value>) -> Result<Option<Value>, EngineError> {
        let request_id = self.next_request.fetch_add(1, Ordering::Relaxed);

        let (reply_tx, reply_rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().map_err(|_| EngineError::Disconnected)?;
            pending.insert(request_id, reply_tx);
        }

        let payload = json!({ "command": args, "request_id": request_id });
        let mut line = payload.to_string();
        line.push('\n');

        let write_result = {
            let mut writer = self.writer.lock().await;
            writer.write_all(line.as_bytes()).await
        };

        if let Err(e) = write_result {
            // Never delivered, so nothing will answer it.
            if let Ok(mut pending) = self.pending.lock() {
                pending.remove(&request_id);
            }
            return Err(e.into());
        }

        let reply = reply_rx.await.map_err(|_| EngineError::Disconnected)?;

        if reply.error == "success" {
            Ok(reply.data)
        } else {
            Err(EngineError::Command(reply.error))
        }
    }
}

#[async_trait]
impl Engine for MpvEngine {
    async fn command(&self, args: &[&str]) -> Result<(), EngineError> {
        let args = args.iter().map(|a| json!(a)).collect();
        self.request(args).await.map(|_| ())
    }

    async fn get_property(&self, name: &str) -> Result<PropertyValue, EngineError> {
        let data = self
            .request(vec![json!("get_property"), json!(name)])
            .await?;

        data.and_then(PropertyValue::from_json)
            .ok_or_else(|| EngineError::Protocol(format!("null value for property {name}")))
    }

    async fn set_property(&self, name: &str, value: PropertyValue) -> Result<(), EngineError> {
        self.request(vec![json!("set_property"), json!(name), value.into_json()])
            .await
            .map(|_| ())
    }
}

async fn reader_loop(
    read_half: OwnedReadHalf,
    pending: std::sync::Arc<PendingMap>,
    events_tx: mpsc::Sender<EngineEvent>,
) {
    let mut lines = BufReader::new(read_half).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!("engine IPC read failed: {e}");
                break;
            }
        };

        let message: Value = match serde_json::from_str(&line) {
            Ok(message) => message,
            Err(e) => {
                warn!("unparseable engine IPC message: {e}");
                continue;
            }
        };

        if let Some(name) = message.get("event").and_then(Value::as_str) {
            let event = parse_event(name, &message);
            if events_tx.send(event).await.is_err() {
                break;
            }
            continue;
        }

        if let Some(request_id) = message.get("request_id").and_then(Value::as_u64) {
            let reply = Reply {
                error: message
                    .get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string(),
                data: message.get("data").cloned(),
            };

            let waiter = pending
                .lock()
                .ok()
                .and_then(|mut map| map.remove(&request_id));

            match waiter {
                Some(tx) => {
                    let _ = tx.send(reply);
                }
                None => debug!("reply for unknown request id {request_id}"),
            }
        }
    }

    // Connection gone; fail anything still waiting for a reply.
    if let Ok(mut map) = pending.lock() {
        map.clear();
    }
}

fn parse_event(name: &str, message: &Value) -> EngineEvent {
    if name == "log-message" {
        let field = |key: &str| {
            message
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .trim_end()
                .to_string()
        };

        return EngineEvent::LogMessage {
            level: field("level"),
            prefix: field("prefix"),
            text: field("text"),
        };
    }

    EngineEvent::from_name(name)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Adapter wired to a dead socketpair instead of a live mpv.
    fn disconnected_engine() -> MpvEngine {
        let (local, peer) = UnixStream::pair().unwrap();
        drop(peer);
        let (_read_half, write_half) = local.into_split();

        let child = Command::new("true").spawn().unwrap();

        MpvEngine {
            writer: Mutex::new(write_half),
            pending: std::sync::Arc::new(PendingMap::default()),
            next_request: AtomicU64::new(1),
            _child: child,
        }
    }

    #[tokio::test]
    async fn failed_write_clears_pending_waiter() {
        let engine = disconnected_engine();

        // Close the write side so the send reliably errors.
        let _ = engine.writer.lock().await.shutdown().await;

        let result = engine
            .request(vec![json!("get_property"), json!("path")])
            .await;

        assert!(result.is_err());
        assert!(engine.pending.lock().unwrap().is_empty());
    }
}
