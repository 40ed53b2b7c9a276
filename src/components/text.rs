use serde::{Deserialize, Serialize};

use crate::components::sprite::Color;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
/// Text drawn in screen space by the text system.
pub struct Text {
    /// The text content to render.
    pub text: String,
    pub x: f32,
    pub y: f32,
    /// Hidden texts stay matched but are skipped when drawing.
    pub visible: bool,
    pub color: Color,
}

impl Default for Text {
    fn default() -> Self {
        Self {
            text: String::new(),
            x: 0.0,
            y: 0.0,
            visible: true,
            color: Color::WHITE,
        }
    }
}

impl Text {
    /// Creates a new visible text at the given screen position.
    pub fn new(content: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            text: content.into(),
            x,
            y,
            ..Self::default()
        }
    }

    /// Updates the text content.
    pub fn set_content(&mut self, new_content: impl Into<String>) {
        self.text = new_content.into();
    }
}
