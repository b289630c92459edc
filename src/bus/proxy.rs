use std::collections::HashMap;

use zbus::proxy;

/// Client-side view of the player interface, for control tools.
#[proxy(
    interface = "io.spindle.Player1",
    default_service = "io.spindle",
    default_path = "/io/spindle"
)]
pub trait Player {
    fn play(&self) -> zbus::Result<()>;

    fn pause(&self) -> zbus::Result<()>;

    fn toggle(&self) -> zbus::Result<()>;

    fn stop(&self) -> zbus::Result<()>;

    fn seek(&self, seconds: i64) -> zbus::Result<()>;

    fn next(&self) -> zbus::Result<()>;

    fn prev(&self) -> zbus::Result<()>;

    fn goto_track(&self, index: i64) -> zbus::Result<()>;

    fn add_track(&self, path: &str) -> zbus::Result<()>;

    fn add_list(&self, path: &str) -> zbus::Result<()>;

    fn remove_track(&self, index: i64) -> zbus::Result<()>;

    fn set_loop(&self, mode: &str) -> zbus::Result<()>;

    fn set_replaygain(&self, mode: &str) -> zbus::Result<()>;

    #[allow(clippy::type_complexity)]
    fn status(
        &self,
    ) -> zbus::Result<(
        String,
        String,
        f64,
        f64,
        f64,
        HashMap<String, String>,
        String,
        String,
    )>;

    fn playlist(&self) -> zbus::Result<(Vec<String>, i64, i64)>;

    fn quit(&self) -> zbus::Result<()>;

    #[zbus(signal)]
    fn status_changed(&self, state: &str) -> zbus::Result<()>;

    #[zbus(signal)]
    fn track_changed(&self) -> zbus::Result<()>;
}
