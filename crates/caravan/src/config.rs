// Author: Dustin Pilgrim
// License: MIT
//
// ~/.config/caravan/caravan.rune, all keys optional:
//
//   caravan:
//     template "$env.HOME/.config/caravan/previous.png"
//     app_id "Civ5XP"
//     output "DP-1"
//     max_attempts "10"
//     scroll_value "120"
//     settle_ms "100"
//     match_step "2"
//     match_tolerance "8"
//     capture_program "grim"
//     alarm_player "mpv"
//     alarm_sound "/usr/share/sounds/freedesktop/stereo/suspend-error.oga"
//     notify "true"
//   end

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rune_cfg::RuneConfig;

use crate::paths::config_dir;

const KEYS: &[&str] = &[
    "template",
    "app_id",
    "output",
    "max_attempts",
    "scroll_value",
    "settle_ms",
    "match_step",
    "match_tolerance",
    "capture_program",
    "alarm_player",
    "alarm_sound",
    "notify",
];

#[derive(Debug, Clone, PartialEq)]
pub struct CaravanConfig {
    /// Reference image of the list entry to click.
    pub template: PathBuf,
    /// Instance/app id of the window that must have focus.
    pub app_id: String,
    /// Pin the output to drive; otherwise the compositor decides.
    pub output: Option<String>,
    pub max_attempts: u32,
    pub scroll_value: f64,
    /// Pause after actions that make the game redraw.
    pub settle: Duration,
    pub match_step: u32,
    pub match_tolerance: f64,
    pub capture_program: String,
    pub alarm_player: String,
    pub alarm_sound: PathBuf,
    pub notify: bool,
}

impl Default for CaravanConfig {
    fn default() -> Self {
        Self {
            template: config_dir().join("previous.png"),
            app_id: "Civ5XP".into(),
            output: None,
            max_attempts: 10,
            scroll_value: 120.0,
            settle: Duration::from_millis(100),
            match_step: 2,
            match_tolerance: 8.0,
            capture_program: "grim".into(),
            alarm_player: "mpv".into(),
            alarm_sound: PathBuf::from("/usr/share/sounds/freedesktop/stereo/suspend-error.oga"),
            notify: true,
        }
    }
}

pub fn load(path: &Path) -> Result<CaravanConfig, String> {
    if !path.exists() {
        return Ok(CaravanConfig::default());
    }

    let rc = RuneConfig::from_file(path).map_err(|e| format!("failed to read config: {e}"))?;

    if !rc.has("caravan") {
        return Ok(CaravanConfig::default());
    }

    parse_config(|key| {
        rc.get_optional::<String>(&format!("caravan.{key}"))
            .map_err(|e| e.to_string())
    })
}

fn parse_config<F>(mut lookup: F) -> Result<CaravanConfig, String>
where
    F: FnMut(&str) -> Result<Option<String>, String>,
{
    let mut cfg = CaravanConfig::default();

    for key in KEYS {
        let value = lookup(key).map_err(|e| format!("config error at caravan.{key}: {e}"))?;
        if let Some(value) = value {
            apply(&mut cfg, key, value.trim())
                .map_err(|e| format!("config error at caravan.{key}: {e}"))?;
        }
    }

    Ok(cfg)
}

fn apply(cfg: &mut CaravanConfig, key: &str, value: &str) -> Result<(), String> {
    match key {
        "template" => cfg.template = expand_env(value),
        "app_id" => cfg.app_id = non_empty(value)?.to_string(),
        "output" => cfg.output = Some(non_empty(value)?.to_string()),
        "max_attempts" => {
            cfg.max_attempts = parse_num::<u32>(value)?;
            if cfg.max_attempts == 0 {
                return Err("must be at least 1".into());
            }
        }
        "scroll_value" => cfg.scroll_value = parse_num(value)?,
        "settle_ms" => cfg.settle = Duration::from_millis(parse_num(value)?),
        "match_step" => cfg.match_step = parse_num::<u32>(value)?.max(1),
        "match_tolerance" => cfg.match_tolerance = parse_num(value)?,
        "capture_program" => cfg.capture_program = non_empty(value)?.to_string(),
        "alarm_player" => cfg.alarm_player = non_empty(value)?.to_string(),
        "alarm_sound" => cfg.alarm_sound = expand_env(value),
        "notify" => cfg.notify = parse_bool(value)?,
        other => return Err(format!("unknown key {other}")),
    }
    Ok(())
}

fn non_empty(value: &str) -> Result<&str, String> {
    if value.is_empty() {
        Err("must not be empty".into())
    } else {
        Ok(value)
    }
}

fn parse_num<T: std::str::FromStr>(value: &str) -> Result<T, String> {
    value
        .parse::<T>()
        .map_err(|_| format!("expected a number, got \"{value}\""))
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => Err(format!("expected true|false, got \"{other}\"")),
    }
}

fn expand_env(s: &str) -> PathBuf {
    let mut out = s.to_string();

    if let Ok(home) = env::var("HOME") {
        if out.contains("$env.HOME") {
            out = out.replace("$env.HOME", &home);
        }
        if let Some(rest) = out.strip_prefix("~/") {
            out = format!("{home}/{rest}");
        }
    }

    PathBuf::from(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn parse(pairs: &[(&str, &str)]) -> Result<CaravanConfig, String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        parse_config(|key| Ok(map.get(key).cloned()))
    }

    #[test]
    fn empty_config_is_default() {
        assert_eq!(parse(&[]).unwrap(), CaravanConfig::default());
    }

    #[test]
    fn values_override_defaults() {
        let cfg = parse(&[
            ("max_attempts", "15"),
            ("scroll_value", "-60"),
            ("settle_ms", "250"),
            ("output", "HDMI-A-1"),
            ("notify", "no"),
            ("template", "/srv/previous.png"),
        ])
        .unwrap();

        assert_eq!(cfg.max_attempts, 15);
        assert_eq!(cfg.scroll_value, -60.0);
        assert_eq!(cfg.settle, Duration::from_millis(250));
        assert_eq!(cfg.output.as_deref(), Some("HDMI-A-1"));
        assert!(!cfg.notify);
        assert_eq!(cfg.template, PathBuf::from("/srv/previous.png"));
        assert_eq!(cfg.capture_program, "grim");
    }

    #[test]
    fn bad_number_names_the_key() {
        let err = parse(&[("max_attempts", "ten")]).unwrap_err();
        assert!(err.contains("caravan.max_attempts"), "{err}");
    }

    #[test]
    fn zero_attempts_is_rejected() {
        assert!(parse(&[("max_attempts", "0")]).is_err());
    }

    #[test]
    fn step_is_at_least_one() {
        assert_eq!(parse(&[("match_step", "0")]).unwrap().match_step, 1);
    }

    #[test]
    fn lookup_error_is_reported() {
        let err = parse_config(|key| {
            if key == "app_id" {
                Err("expected string".into())
            } else {
                Ok(None)
            }
        })
        .unwrap_err();
        assert_eq!(err, "config error at caravan.app_id: expected string");
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load(&dir.path().join("nope.rune")).unwrap();
        assert_eq!(cfg, CaravanConfig::default());
    }
}
