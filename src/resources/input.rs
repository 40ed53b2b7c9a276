//! Per-frame action input.
//!
//! The engine never reads devices itself. The host feeds [`InputState`] the
//! set of keys held down each frame, and systems or behaviors query named
//! actions through the [`InputQuery`] trait. Which keys drive which action is
//! described by [`InputBindings`], loadable from a JSON file:
//!
//! ```json
//! { "key_bindings": { "up": ["Up", "W"], "ok": ["Z", "Enter"] } }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use log::info;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::resources::gameconfig::ConfigResult;

pub const ACTION_UP: &str = "up";
pub const ACTION_DOWN: &str = "down";
pub const ACTION_LEFT: &str = "left";
pub const ACTION_RIGHT: &str = "right";
pub const ACTION_OK: &str = "ok";
pub const ACTION_CANCEL: &str = "cancel";
pub const ACTION_MENU: &str = "menu";

/// Read-only view of the current frame's input. Never blocks.
pub trait InputQuery {
    fn is_action_active(&self, action: &str) -> bool;

    fn is_action_just_pressed(&self, _action: &str) -> bool {
        false
    }

    fn is_action_just_released(&self, _action: &str) -> bool {
        false
    }
}

/// Boolean action state for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionState {
    /// Whether the action is currently held.
    pub active: bool,
    /// Whether the action went down this frame.
    pub just_pressed: bool,
    /// Whether the action went up this frame.
    pub just_released: bool,
}

impl ActionState {
    fn advance(&mut self, pressed: bool) {
        self.just_pressed = pressed && !self.active;
        self.just_released = !pressed && self.active;
        self.active = pressed;
    }
}

/// Action → key names mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputBindings {
    pub key_bindings: BTreeMap<String, Vec<String>>,
}

impl Default for InputBindings {
    fn default() -> Self {
        let defaults: [(&str, &[&str]); 7] = [
            (ACTION_UP, &["Up", "W"]),
            (ACTION_DOWN, &["Down", "S"]),
            (ACTION_LEFT, &["Left", "A"]),
            (ACTION_RIGHT, &["Right", "D"]),
            (ACTION_OK, &["Z", "Enter"]),
            (ACTION_CANCEL, &["X", "Backspace"]),
            (ACTION_MENU, &["Escape"]),
        ];
        Self {
            key_bindings: defaults
                .into_iter()
                .map(|(action, keys)| {
                    (
                        action.to_string(),
                        keys.iter().map(|k| k.to_string()).collect(),
                    )
                })
                .collect(),
        }
    }
}

impl InputBindings {
    pub fn empty() -> Self {
        Self {
            key_bindings: BTreeMap::new(),
        }
    }

    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let data = std::fs::read_to_string(path)?;
        let bindings: InputBindings = serde_json::from_str(&data)?;
        info!(
            "Loaded {} action bindings from {:?}",
            bindings.key_bindings.len(),
            path
        );
        Ok(bindings)
    }

    pub fn save_to_file(&self, path: &Path) -> ConfigResult<()> {
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }

    /// Add a key to an action, ignoring duplicates.
    pub fn bind(&mut self, action: &str, key: &str) {
        let keys = self.key_bindings.entry(action.to_string()).or_default();
        if !keys.iter().any(|k| k.eq_ignore_ascii_case(key)) {
            keys.push(key.to_string());
        }
    }

    pub fn keys_for(&self, action: &str) -> &[String] {
        self.key_bindings.get(action).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.key_bindings.keys().map(String::as_str)
    }
}

/// Input resource: action states derived from the host's key snapshot.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    bindings: InputBindings,
    actions: FxHashMap<String, ActionState>,
}

impl InputState {
    pub fn new(bindings: InputBindings) -> Self {
        Self {
            bindings,
            actions: FxHashMap::default(),
        }
    }

    pub fn bindings(&self) -> &InputBindings {
        &self.bindings
    }

    /// Advance one frame from the names of the keys currently held.
    /// Key names compare case-insensitively.
    pub fn update_from_keys(&mut self, pressed: &[&str]) {
        for (action, keys) in &self.bindings.key_bindings {
            let down = keys
                .iter()
                .any(|key| pressed.iter().any(|p| p.eq_ignore_ascii_case(key)));
            self.actions.entry(action.clone()).or_default().advance(down);
        }
    }

    /// Drive an action directly, bypassing key bindings.
    pub fn set_action(&mut self, action: &str, pressed: bool) {
        self.actions.entry(action.to_string()).or_default().advance(pressed);
    }

    pub fn action(&self, action: &str) -> ActionState {
        self.actions.get(action).copied().unwrap_or_default()
    }
}

impl InputQuery for InputState {
    fn is_action_active(&self, action: &str) -> bool {
        self.action(action).active
    }

    fn is_action_just_pressed(&self, action: &str) -> bool {
        self.action(action).just_pressed
    }

    fn is_action_just_released(&self, action: &str) -> bool {
        self.action(action).just_released
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bindings_cover_every_action() {
        let b = InputBindings::default();
        let actions: Vec<&str> = b.actions().collect();
        for action in [
            ACTION_UP,
            ACTION_DOWN,
            ACTION_LEFT,
            ACTION_RIGHT,
            ACTION_OK,
            ACTION_CANCEL,
            ACTION_MENU,
        ] {
            assert!(actions.contains(&action), "missing {}", action);
        }
        assert_eq!(b.keys_for("menu"), &["Escape".to_string()]);
        assert!(b.keys_for("jump").is_empty());
    }

    #[test]
    fn edges_are_reported_for_one_frame() {
        let mut input = InputState::new(InputBindings::default());
        input.update_from_keys(&["w"]);
        assert!(input.is_action_active(ACTION_UP));
        assert!(input.is_action_just_pressed(ACTION_UP));

        input.update_from_keys(&["W"]);
        assert!(input.is_action_active(ACTION_UP));
        assert!(!input.is_action_just_pressed(ACTION_UP));

        input.update_from_keys(&[]);
        assert!(!input.is_action_active(ACTION_UP));
        assert!(input.is_action_just_released(ACTION_UP));
    }

    #[test]
    fn unknown_action_is_inactive() {
        let input = InputState::default();
        assert_eq!(input.action("fly"), ActionState::default());
    }

    #[test]
    fn bindings_round_trip_through_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bindings.json");
        let mut bindings = InputBindings::empty();
        bindings.bind("ok", "Space");
        bindings.bind("ok", "space");
        bindings.save_to_file(&path).unwrap();

        let loaded = InputBindings::load_from_file(&path).unwrap();
        assert_eq!(loaded.keys_for("ok"), &["Space".to_string()]);
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("key_bindings"));
    }
}
