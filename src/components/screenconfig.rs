//! Screen resolution component.
//!
//! A [`ScreenConfig`] is normally attached to a single entity tagged
//! `"screen_config"`. The [`ScreenConfigSystem`] watches it and tells the host
//! when the resolution changes.
//!
//! [`ScreenConfigSystem`]: crate::systems::screenconfig::ScreenConfigSystem

use serde::{Deserialize, Serialize};

const DEFAULT_WIDTH: u32 = 1280;
const DEFAULT_HEIGHT: u32 = 720;

/// Named resolution presets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScreenPreset {
    Hd,
    FullHd,
    Sd,
    Mobile,
    MobileLandscape,
}

impl ScreenPreset {
    pub const ALL: [ScreenPreset; 5] = [
        ScreenPreset::Hd,
        ScreenPreset::FullHd,
        ScreenPreset::Sd,
        ScreenPreset::Mobile,
        ScreenPreset::MobileLandscape,
    ];

    /// Parse a preset name such as `"HD"` or `"MOBILE_L"` (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "HD" => Some(ScreenPreset::Hd),
            "FULL_HD" => Some(ScreenPreset::FullHd),
            "SD" => Some(ScreenPreset::Sd),
            "MOBILE" => Some(ScreenPreset::Mobile),
            "MOBILE_L" => Some(ScreenPreset::MobileLandscape),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ScreenPreset::Hd => "HD",
            ScreenPreset::FullHd => "FULL_HD",
            ScreenPreset::Sd => "SD",
            ScreenPreset::Mobile => "MOBILE",
            ScreenPreset::MobileLandscape => "MOBILE_L",
        }
    }

    /// Width and height in pixels.
    pub fn size(self) -> (u32, u32) {
        match self {
            ScreenPreset::Hd => (1280, 720),
            ScreenPreset::FullHd => (1920, 1080),
            ScreenPreset::Sd => (800, 600),
            ScreenPreset::Mobile => (360, 640),
            ScreenPreset::MobileLandscape => (640, 360),
        }
    }
}

/// Requested screen resolution in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl ScreenConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn from_preset(preset: ScreenPreset) -> Self {
        let (width, height) = preset.size();
        Self { width, height }
    }

    /// Switch to a named preset. Unknown names leave the resolution untouched
    /// and return `false`.
    pub fn set_resolution(&mut self, preset: &str) -> bool {
        match ScreenPreset::from_name(preset) {
            Some(p) => {
                (self.width, self.height) = p.size();
                true
            }
            None => false,
        }
    }
}
