// Author: Dustin Pilgrim
// License: MIT
//
// Sway IPC queries through swaymsg: is the game window focused, and which
// output holds focus.

use std::collections::VecDeque;
use std::process::Command;

use serde_json::Value;

fn swaymsg(kind: &str) -> Result<Value, String> {
    let out = Command::new("swaymsg")
        .args(["-t", kind, "--raw"])
        .output()
        .map_err(|e| format!("spawn swaymsg: {e}"))?;

    if !out.status.success() {
        return Err(format!(
            "swaymsg -t {kind} exited with {}: {}",
            out.status,
            String::from_utf8_lossy(&out.stderr).trim()
        ));
    }

    serde_json::from_slice(&out.stdout).map_err(|e| format!("parse swaymsg {kind}: {e}"))
}

pub fn is_target_app_focused(app_id: &str) -> Result<bool, String> {
    let tree = swaymsg("get_tree")?;
    Ok(focused_app_matches(&tree, app_id))
}

/// Name of the output sway considers focused, if sway is reachable.
pub fn focused_output() -> Option<String> {
    let outputs = swaymsg("get_outputs").ok()?;
    focused_output_name(&outputs)
}

/// Breadth-first search for the focused node; true if it belongs to `app_id`.
///
/// XWayland windows carry the id in `window_properties.instance`, native
/// Wayland ones in `app_id`.
pub fn focused_app_matches(tree: &Value, app_id: &str) -> bool {
    let mut queue: VecDeque<&Value> = VecDeque::from([tree]);

    while let Some(node) = queue.pop_front() {
        if node.get("focused").and_then(Value::as_bool).unwrap_or(false) {
            let instance = node
                .get("window_properties")
                .and_then(|p| p.get("instance"))
                .and_then(Value::as_str);
            let native = node.get("app_id").and_then(Value::as_str);

            return instance == Some(app_id) || native == Some(app_id);
        }

        for key in ["nodes", "floating_nodes"] {
            if let Some(children) = node.get(key).and_then(Value::as_array) {
                queue.extend(children.iter());
            }
        }
    }

    false
}

pub fn focused_output_name(outputs: &Value) -> Option<String> {
    outputs
        .as_array()?
        .iter()
        .find(|o| o.get("focused").and_then(Value::as_bool).unwrap_or(false))
        .and_then(|o| o.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(focused: Value) -> Value {
        json!({
            "type": "root",
            "focused": false,
            "nodes": [{
                "type": "output",
                "name": "DP-1",
                "focused": false,
                "nodes": [{
                    "type": "workspace",
                    "focused": false,
                    "nodes": [
                        { "type": "con", "focused": false, "app_id": "foot" },
                        focused
                    ]
                }]
            }]
        })
    }

    #[test]
    fn xwayland_instance_matches() {
        let t = tree(json!({
            "type": "con",
            "focused": true,
            "app_id": null,
            "window_properties": { "class": "Civ5XP.exe", "instance": "Civ5XP" }
        }));
        assert!(focused_app_matches(&t, "Civ5XP"));
    }

    #[test]
    fn native_app_id_matches() {
        let t = tree(json!({ "type": "con", "focused": true, "app_id": "Civ5XP" }));
        assert!(focused_app_matches(&t, "Civ5XP"));
    }

    #[test]
    fn other_focused_window_does_not_match() {
        let t = tree(json!({ "type": "con", "focused": true, "app_id": "firefox" }));
        assert!(!focused_app_matches(&t, "Civ5XP"));
    }

    #[test]
    fn floating_windows_are_searched() {
        let t = json!({
            "focused": false,
            "nodes": [{
                "focused": false,
                "nodes": [],
                "floating_nodes": [{ "focused": true, "app_id": "Civ5XP" }]
            }]
        });
        assert!(focused_app_matches(&t, "Civ5XP"));
    }

    #[test]
    fn nothing_focused_is_false() {
        assert!(!focused_app_matches(&json!({ "focused": false, "nodes": [] }), "Civ5XP"));
    }

    #[test]
    fn focused_output_is_picked() {
        let outputs = json!([
            { "name": "DP-1", "focused": false },
            { "name": "HDMI-A-1", "focused": true }
        ]);
        assert_eq!(focused_output_name(&outputs).as_deref(), Some("HDMI-A-1"));
        assert_eq!(focused_output_name(&json!([])), None);
    }
}
