//! Spindle - music playback control daemon.
//!
//! Spindle drives an external mpv process over its JSON IPC protocol and
//! exposes playback control on the D-Bus session bus. The main pieces:
//!
//! - A playback state machine and playlist cursor owned by a single task
//! - An event pump serializing engine events with inbound control requests
//! - A D-Bus control interface with status/track change signals
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use spindle::config::Config;
//!
//! // Load configuration from the default location
//! let config = Config::load_default().unwrap_or_default();
//! println!("Library: {:?}", config.library.path);
//! ```

/// D-Bus control interface, served and consumed sides.
pub mod bus;

/// Configuration schema and loading.
pub mod config;

/// Core error types and result aliases.
pub mod core;

/// Playback engine abstraction and the mpv IPC adapter.
pub mod engine;

/// Media library collaborator (random track picks).
pub mod library;

/// Desktop notification collaborator.
pub mod notify;

/// Player core: state machine, playlist cursor, event pump.
pub mod player;

/// Tracing subscriber initialization.
pub mod tracing_config;

/// Re-exported core types for convenience.
pub use self::core::{Result, SpindleError};
