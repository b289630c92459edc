use std::collections::HashMap;

use zbus::{Connection, proxy, zvariant::Value};

/// org.freedesktop.Notifications proxy
///
/// Only the single Notify call is modeled; everything else on the
/// interface is irrelevant here.
#[proxy(
    interface = "org.freedesktop.Notifications",
    default_service = "org.freedesktop.Notifications",
    default_path = "/org/freedesktop/Notifications"
)]
trait Notifications {
    #[allow(clippy::too_many_arguments)]
    fn notify(
        &self,
        app_name: &str,
        replaces_id: u32,
        app_icon: &str,
        summary: &str,
        body: &str,
        actions: Vec<&str>,
        hints: HashMap<&str, Value<'_>>,
        expire_timeout: i32,
    ) -> zbus::Result<u32>;
}

/// Fire-and-forget desktop notification sender.
#[derive(Clone)]
pub struct Notifier {
    proxy: NotificationsProxy<'static>,
}

/// Replacing the previous notification keeps track changes from piling up.
const NOTIFICATION_ID: u32 = 1;

impl Notifier {
    /// Connect to the session notification service.
    ///
    /// # Errors
    /// Returns `zbus::Error` if the session bus is unavailable.
    pub async fn new(connection: &Connection) -> zbus::Result<Self> {
        let proxy = NotificationsProxy::new(connection).await?;
        Ok(Self { proxy })
    }

    /// Show a notification. Failures are the caller's to log; nothing in
    /// playback depends on this call succeeding.
    ///
    /// # Errors
    /// Returns `zbus::Error` if the notification call fails.
    pub async fn notify(&self, summary: &str, body: &str, icon: &str) -> zbus::Result<()> {
        self.proxy
            .notify(
                "spindle",
                NOTIFICATION_ID,
                icon,
                summary,
                body,
                Vec::new(),
                HashMap::new(),
                -1,
            )
            .await?;

        Ok(())
    }
}
