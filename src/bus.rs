//! D-Bus control surface.
//!
//! One interface, `io.spindle.Player1`, served on the session bus under
//! the well-known name `io.spindle`. Method calls translate one-to-one
//! into player requests; player signals translate into D-Bus signals.

mod proxy;
mod service;

pub use proxy::PlayerProxy;
pub use service::serve;

/// Well-known bus name of the daemon.
pub const BUS_NAME: &str = "io.spindle";

/// Object path the player interface is served at.
pub const OBJECT_PATH: &str = "/io/spindle";

/// Interface name of the player control surface.
pub const INTERFACE_NAME: &str = "io.spindle.Player1";
