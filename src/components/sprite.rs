use serde::{Deserialize, Serialize};

/// RGBA color, 8 bits per channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::new(255, 255, 255, 255);
    pub const BLACK: Color = Color::new(0, 0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Multiply two colors component-wise.
    pub fn multiply(&self, other: Color) -> Color {
        Color::new(
            ((self.r as u16 * other.r as u16) / 255) as u8,
            ((self.g as u16 * other.g as u16) / 255) as u8,
            ((self.b as u16 * other.b as u16) / 255) as u8,
            ((self.a as u16 * other.a as u16) / 255) as u8,
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Sprite is identified by an image key, its size in world units and a draw layer.
/// Lower layers are drawn first. Without an image key the host draws a filled
/// rectangle of `color`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sprite {
    pub image: String,
    pub width: f32,
    pub height: f32,
    pub layer: i32,
    pub color: Color,
}

impl Default for Sprite {
    fn default() -> Self {
        Self {
            image: String::new(),
            width: 32.0,
            height: 32.0,
            layer: 0,
            color: Color::WHITE,
        }
    }
}

impl Sprite {
    pub fn new(image: impl Into<String>, width: f32, height: f32) -> Self {
        Self {
            image: image.into(),
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_layer(mut self, layer: i32) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_white_32_square() {
        let s = Sprite::default();
        assert_eq!(s.width, 32.0);
        assert_eq!(s.height, 32.0);
        assert_eq!(s.color, Color::WHITE);
        assert!(s.image.is_empty());
    }

    #[test]
    fn multiply_with_white_is_identity() {
        let c = Color::new(10, 20, 30, 40);
        assert_eq!(c.multiply(Color::WHITE), c);
        assert_eq!(c.multiply(Color::new(0, 0, 0, 0)), Color::new(0, 0, 0, 0));
    }
}
