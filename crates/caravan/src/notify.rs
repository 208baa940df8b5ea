// Author: Dustin Pilgrim
// License: MIT
//
// Desktop notification via org.freedesktop.Notifications. Best-effort: a
// missing notification daemon never changes the outcome of a run.

use std::collections::HashMap;

use zbus::zvariant::Value;
use zbus::{Connection, Proxy};

const DEST: &str = "org.freedesktop.Notifications";
const PATH: &str = "/org/freedesktop/Notifications";
const IFACE: &str = "org.freedesktop.Notifications";

const URGENCY_CRITICAL: u8 = 2;

/// Critical notification that stays up until dismissed.
pub fn notify_failed(summary: &str, body: &str) -> Result<(), String> {
    zbus::block_on(async {
        let conn = Connection::session()
            .await
            .map_err(|e| format!("notify: dbus session connect: {e}"))?;

        let proxy = Proxy::new(&conn, DEST, PATH, IFACE)
            .await
            .map_err(|e| format!("notify: proxy: {e}"))?;

        let mut hints: HashMap<&str, Value<'_>> = HashMap::new();
        hints.insert("urgency", Value::from(URGENCY_CRITICAL));

        // Notify(app_name, replaces_id, app_icon, summary, body, actions, hints, expire_timeout)
        let _: u32 = proxy
            .call(
                "Notify",
                &(
                    "Caravan",
                    0u32,
                    "dialog-error",
                    summary,
                    body,
                    Vec::<&str>::new(),
                    hints,
                    0i32,
                ),
            )
            .await
            .map_err(|e| format!("notify: call Notify: {e}"))?;

        Ok(())
    })
}
