// Author: Dustin Pilgrim
// License: MIT

use std::path::PathBuf;
use std::process::{Command, Stdio};

use caravan_core::Alarm;
use eventline::{info, warn};

use crate::notify;

/// Plays a sound file with an external player and, optionally, raises a
/// desktop notification. Neither failure is escalated.
pub struct SoundAlarm {
    player: String,
    sound: PathBuf,
    notify: bool,
}

impl SoundAlarm {
    pub fn new(player: impl Into<String>, sound: impl Into<PathBuf>, notify: bool) -> Self {
        Self {
            player: player.into(),
            sound: sound.into(),
            notify,
        }
    }

    fn play(&self) -> Result<(), String> {
        let status = Command::new(&self.player)
            .arg("--quiet")
            .arg(&self.sound)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status()
            .map_err(|e| format!("spawn {}: {e}", self.player))?;

        if !status.success() {
            return Err(format!("{} exited with {status}", self.player));
        }
        Ok(())
    }
}

impl Alarm for SoundAlarm {
    fn ring(&mut self, reason: &str) {
        info!("alarm: {reason}");

        if self.notify {
            if let Err(e) = notify::notify_failed("Caravan stopped", reason) {
                warn!("{e}");
            }
        }

        if let Err(e) = self.play() {
            warn!("alarm sound failed: {e}");
        }
    }
}
