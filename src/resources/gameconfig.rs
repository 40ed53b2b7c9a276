//! Engine configuration.
//!
//! Settings are loaded from an INI file. Every field has a safe default, and
//! keys missing from the file keep their current value.
//!
//! # Configuration File Format
//!
//! ```ini
//! [screen]
//! preset = HD
//! width = 1280
//! height = 720
//!
//! [loop]
//! fixed_dt = 0.0166667
//! cleanup_interval = 60
//!
//! [physics]
//! min_y = -50
//! max_y = 650
//! despawn_tag = bullet
//!
//! [debug]
//! enabled = false
//!
//! [input]
//! bindings = ./bindings.json
//! ```
//!
//! When `preset` is present it overrides `width`/`height`.

use std::path::{Path, PathBuf};

use configparser::ini::Ini;
use log::{info, warn};
use thiserror::Error;

use crate::components::screenconfig::ScreenPreset;

const DEFAULT_SCREEN_WIDTH: u32 = 1280;
const DEFAULT_SCREEN_HEIGHT: u32 = 720;
const DEFAULT_FIXED_DT: f32 = 1.0 / 60.0;
const DEFAULT_CLEANUP_INTERVAL: u32 = 60;
const DEFAULT_MIN_Y: f32 = -50.0;
const DEFAULT_MAX_Y: f32 = 650.0;
const DEFAULT_DESPAWN_TAG: &str = "bullet";
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

/// Errors raised while reading or writing configuration files.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load config file {path:?}: {message}")]
    Load { path: PathBuf, message: String },

    #[error("failed to save config file {path:?}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid value for [{section}] {key}: {value}")]
    InvalidValue {
        section: &'static str,
        key: &'static str,
        value: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Vertical bounds outside of which the physics system retires entities.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsBounds {
    pub min_y: f32,
    pub max_y: f32,
    /// Tag removed from entities that leave the bounds.
    pub despawn_tag: String,
}

impl Default for PhysicsBounds {
    fn default() -> Self {
        Self {
            min_y: DEFAULT_MIN_Y,
            max_y: DEFAULT_MAX_Y,
            despawn_tag: DEFAULT_DESPAWN_TAG.to_string(),
        }
    }
}

impl PhysicsBounds {
    pub fn contains(&self, y: f32) -> bool {
        y >= self.min_y && y <= self.max_y
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Initial screen width in pixels.
    pub screen_width: u32,
    /// Initial screen height in pixels.
    pub screen_height: u32,
    /// Seconds advanced per frame.
    pub fixed_dt: f32,
    /// Frames between inactive-entity sweeps. `0` disables the sweep.
    pub cleanup_interval: u32,
    pub physics: PhysicsBounds,
    /// Verbose match/unmatch logging.
    pub debug: bool,
    /// Optional JSON key-binding file.
    pub bindings_path: Option<PathBuf>,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfig {
    /// Create a configuration with safe default values.
    pub fn new() -> Self {
        Self {
            screen_width: DEFAULT_SCREEN_WIDTH,
            screen_height: DEFAULT_SCREEN_HEIGHT,
            fixed_dt: DEFAULT_FIXED_DT,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            physics: PhysicsBounds::default(),
            debug: false,
            bindings_path: None,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load values from `config_path`. Missing keys retain their current values.
    pub fn load_from_file(&mut self) -> ConfigResult<()> {
        let mut config = Ini::new();
        config.load(&self.config_path).map_err(|message| ConfigError::Load {
            path: self.config_path.clone(),
            message,
        })?;
        self.apply(&config)?;

        info!(
            "Loaded config: {}x{} screen, dt={}, cleanup every {} frames, debug={}",
            self.screen_width, self.screen_height, self.fixed_dt, self.cleanup_interval, self.debug
        );
        Ok(())
    }

    /// Parse values from INI text. Used by tests and embedded defaults.
    pub fn load_from_str(&mut self, text: &str) -> ConfigResult<()> {
        let mut config = Ini::new();
        config.read(text.to_string()).map_err(|message| ConfigError::Load {
            path: PathBuf::from("<string>"),
            message,
        })?;
        self.apply(&config)
    }

    fn apply(&mut self, config: &Ini) -> ConfigResult<()> {
        // [screen]
        if let Some(width) = read_u32(config, "screen", "width") {
            self.screen_width = width;
        }
        if let Some(height) = read_u32(config, "screen", "height") {
            self.screen_height = height;
        }
        if let Some(preset) = config.get("screen", "preset") {
            let preset = ScreenPreset::from_name(&preset).ok_or(ConfigError::InvalidValue {
                section: "screen",
                key: "preset",
                value: preset.clone(),
            })?;
            (self.screen_width, self.screen_height) = preset.size();
        }

        // [loop]
        if let Some(dt) = config.getfloat("loop", "fixed_dt").ok().flatten() {
            if dt <= 0.0 {
                return Err(ConfigError::InvalidValue {
                    section: "loop",
                    key: "fixed_dt",
                    value: dt.to_string(),
                });
            }
            self.fixed_dt = dt as f32;
        }
        if let Some(interval) = read_u32(config, "loop", "cleanup_interval") {
            self.cleanup_interval = interval;
        }

        // [physics]
        if let Some(min_y) = config.getfloat("physics", "min_y").ok().flatten() {
            self.physics.min_y = min_y as f32;
        }
        if let Some(max_y) = config.getfloat("physics", "max_y").ok().flatten() {
            self.physics.max_y = max_y as f32;
        }
        if let Some(tag) = config.get("physics", "despawn_tag") {
            self.physics.despawn_tag = tag;
        }

        // [debug]
        if let Some(enabled) = config.getbool("debug", "enabled").ok().flatten() {
            self.debug = enabled;
        }

        // [input]
        if let Some(path) = config.get("input", "bindings") {
            if path.trim().is_empty() {
                self.bindings_path = None;
            } else {
                self.bindings_path = Some(PathBuf::from(path));
            }
        }

        if self.physics.min_y > self.physics.max_y {
            warn!(
                "physics bounds are inverted (min_y={} > max_y={}); every body will be retired",
                self.physics.min_y, self.physics.max_y
            );
        }
        Ok(())
    }

    /// Save the configuration to `config_path`, creating the file if needed.
    pub fn save_to_file(&self) -> ConfigResult<()> {
        self.save_to(&self.config_path)
    }

    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let mut config = Ini::new();

        config.set("screen", "width", Some(self.screen_width.to_string()));
        config.set("screen", "height", Some(self.screen_height.to_string()));

        config.set("loop", "fixed_dt", Some(self.fixed_dt.to_string()));
        config.set("loop", "cleanup_interval", Some(self.cleanup_interval.to_string()));

        config.set("physics", "min_y", Some(self.physics.min_y.to_string()));
        config.set("physics", "max_y", Some(self.physics.max_y.to_string()));
        config.set("physics", "despawn_tag", Some(self.physics.despawn_tag.clone()));

        config.set("debug", "enabled", Some(self.debug.to_string()));

        if let Some(bindings) = &self.bindings_path {
            config.set("input", "bindings", Some(bindings.display().to_string()));
        }

        config.write(path).map_err(|source| ConfigError::Save {
            path: path.to_path_buf(),
            source,
        })?;

        info!("Saved config to {:?}", path);
        Ok(())
    }

    pub fn screen_size(&self) -> (u32, u32) {
        (self.screen_width, self.screen_height)
    }

    pub fn set_screen_size(&mut self, width: u32, height: u32) {
        self.screen_width = width;
        self.screen_height = height;
    }
}

/// Unsigned value that fits in a `u32`. Out-of-range values are ignored with
/// a warning so the current setting stays in place.
fn read_u32(config: &Ini, section: &str, key: &str) -> Option<u32> {
    let value = config.getuint(section, key).ok().flatten()?;
    match u32::try_from(value) {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("[{}] {} = {} is out of range, keeping the current value", section, key, value);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_engine_constants() {
        let config = EngineConfig::new();
        assert_eq!(config.screen_size(), (1280, 720));
        assert_eq!(config.cleanup_interval, 60);
        assert_eq!(config.physics.min_y, -50.0);
        assert_eq!(config.physics.max_y, 650.0);
        assert_eq!(config.physics.despawn_tag, "bullet");
        assert!(!config.debug);
    }

    #[test]
    fn missing_keys_keep_defaults() {
        let mut config = EngineConfig::new();
        config.load_from_str("[physics]\nmax_y = 480\n").unwrap();
        assert_eq!(config.physics.max_y, 480.0);
        assert_eq!(config.physics.min_y, -50.0);
        assert_eq!(config.screen_size(), (1280, 720));
    }

    #[test]
    fn preset_overrides_explicit_size() {
        let mut config = EngineConfig::new();
        config
            .load_from_str("[screen]\nwidth = 10\nheight = 10\npreset = mobile\n")
            .unwrap();
        assert_eq!(config.screen_size(), (360, 640));
    }

    #[test]
    fn unknown_preset_is_rejected() {
        let mut config = EngineConfig::new();
        let err = config.load_from_str("[screen]\npreset = cinema\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "preset", .. }));
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.ini");
        let mut config = EngineConfig::with_path(&path);
        config.set_screen_size(800, 600);
        config.cleanup_interval = 30;
        config.debug = true;
        config.physics.despawn_tag = "shot".into();
        config.save_to_file().unwrap();

        let mut loaded = EngineConfig::with_path(&path);
        loaded.load_from_file().unwrap();
        assert_eq!(loaded.screen_size(), (800, 600));
        assert_eq!(loaded.cleanup_interval, 30);
        assert!(loaded.debug);
        assert_eq!(loaded.physics.despawn_tag, "shot");
    }

    #[test]
    fn out_of_range_integers_keep_defaults() {
        let mut config = EngineConfig::new();
        config
            .load_from_str("[screen]\nwidth = 4294967296\nheight = 600\n[loop]\ncleanup_interval = 4294967356\n")
            .unwrap();
        assert_eq!(config.screen_size(), (1280, 600));
        assert_eq!(config.cleanup_interval, 60);
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let mut config = EngineConfig::with_path("/definitely/not/here.ini");
        assert!(matches!(config.load_from_file(), Err(ConfigError::Load { .. })));
    }
}
