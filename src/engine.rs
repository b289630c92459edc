mod ipc;

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

pub use ipc::MpvEngine;

/// Errors reported by the playback engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine rejected a command or property write
    #[error("engine rejected command: {0}")]
    Command(String),

    /// The engine process could not be started
    #[error("could not start engine: {0}")]
    Spawn(String),

    /// Malformed or unexpected data on the IPC channel
    #[error("engine protocol error: {0}")]
    Protocol(String),

    /// The IPC connection to the engine went away
    #[error("engine connection closed")]
    Disconnected,

    /// I/O failure on the IPC channel
    #[error("engine i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// A property value crossing the engine boundary.
///
/// Mirrors the engine's own node formats; anything the engine can hand
/// back is representable here.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Boolean flag
    Flag(bool),

    /// Signed integer
    Int(i64),

    /// Floating point number
    Double(f64),

    /// String
    Str(String),

    /// Array of values
    List(Vec<PropertyValue>),

    /// String-keyed map of values
    Map(HashMap<String, PropertyValue>),
}

impl PropertyValue {
    /// Interpret as a flag, if possible.
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(v) => Some(*v),
            _ => None,
        }
    }

    /// Interpret as an integer, if possible.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Double(v) => Some(*v as i64),
            _ => None,
        }
    }

    /// Interpret as a double, if possible.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Interpret as a string slice, if possible.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Convert a JSON value from the IPC channel.
    ///
    /// Returns `None` for JSON null (the engine's "no value").
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        use serde_json::Value;

        match value {
            Value::Null => None,
            Value::Bool(v) => Some(Self::Flag(v)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Self::Int(i))
                } else {
                    n.as_f64().map(Self::Double)
                }
            }
            Value::String(s) => Some(Self::Str(s)),
            Value::Array(items) => Some(Self::List(
                items.into_iter().filter_map(Self::from_json).collect(),
            )),
            Value::Object(entries) => Some(Self::Map(
                entries
                    .into_iter()
                    .filter_map(|(k, v)| Self::from_json(v).map(|v| (k, v)))
                    .collect(),
            )),
        }
    }

    /// Convert into a JSON value for the IPC channel.
    pub fn into_json(self) -> serde_json::Value {
        use serde_json::Value;

        match self {
            Self::Flag(v) => Value::Bool(v),
            Self::Int(v) => Value::from(v),
            Self::Double(v) => Value::from(v),
            Self::Str(v) => Value::String(v),
            Self::List(items) => Value::Array(items.into_iter().map(Self::into_json).collect()),
            Self::Map(entries) => Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, v.into_json()))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        Self::Flag(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

/// An asynchronous event reported by the playback engine.
///
/// Closed set; anything the pump does not model arrives as `Other` and is
/// logged and ignored.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Playback went idle (nothing left to play)
    Idle,

    /// Playback was paused
    Pause,

    /// Playback was unpaused
    Unpause,

    /// Playback (re)started after a seek or track start
    PlaybackRestart,

    /// A new file started playing
    StartFile,

    /// The current file finished
    EndFile,

    /// Track metadata was updated
    MetadataUpdate,

    /// Engine log line
    LogMessage {
        /// Log level string as reported by the engine
        level: String,
        /// Engine component that produced the message
        prefix: String,
        /// Message text
        text: String,
    },

    /// The engine is shutting down; terminates the event pump
    Shutdown,

    /// Any event the pump does not model
    Other(String),
}

impl EngineEvent {
    /// Map an engine event name to its variant.
    pub fn from_name(name: &str) -> Self {
        match name {
            "idle" => Self::Idle,
            "pause" => Self::Pause,
            "unpause" => Self::Unpause,
            "playback-restart" => Self::PlaybackRestart,
            "start-file" => Self::StartFile,
            "end-file" => Self::EndFile,
            "metadata-update" => Self::MetadataUpdate,
            "shutdown" => Self::Shutdown,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for EngineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Pause => write!(f, "pause"),
            Self::Unpause => write!(f, "unpause"),
            Self::PlaybackRestart => write!(f, "playback-restart"),
            Self::StartFile => write!(f, "start-file"),
            Self::EndFile => write!(f, "end-file"),
            Self::MetadataUpdate => write!(f, "metadata-update"),
            Self::LogMessage { prefix, .. } => write!(f, "log-message({prefix})"),
            Self::Shutdown => write!(f, "shutdown"),
            Self::Other(name) => write!(f, "{name}"),
        }
    }
}

/// Synchronous call surface to the playback engine.
///
/// All calls are short awaits from the caller's perspective; the engine's
/// asynchronous events arrive separately on the channel handed out at
/// adapter construction. The handle is only ever driven from the player
/// core task.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Issue a command to the engine.
    ///
    /// # Errors
    /// Surfaces the engine's own error message in `EngineError::Command`.
    async fn command(&self, args: &[&str]) -> Result<(), EngineError>;

    /// Read a named engine property.
    ///
    /// # Errors
    /// Returns `EngineError::Command` when the property is unavailable.
    async fn get_property(&self, name: &str) -> Result<PropertyValue, EngineError>;

    /// Write a named engine property.
    ///
    /// # Errors
    /// Surfaces the engine's own error message in `EngineError::Command`.
    async fn set_property(&self, name: &str, value: PropertyValue) -> Result<(), EngineError>;
}
