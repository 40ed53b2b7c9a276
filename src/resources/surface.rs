//! Frame surface abstraction.
//!
//! Render-class systems draw through [`FrameSurface`]; the host decides what
//! a draw actually does. [`DrawList`] records the calls, which is all a
//! headless host or a test needs.

use crate::components::sprite::{Color, Sprite};
use crate::components::text::Text;
use crate::components::transform::Transform;

pub trait FrameSurface {
    fn clear(&mut self, _color: Color) {}

    fn draw_sprite(&mut self, transform: &Transform, sprite: &Sprite);

    fn draw_text(&mut self, text: &Text);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Color),
    Sprite {
        image: String,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        scale_x: f32,
        scale_y: f32,
        rotation: f32,
        layer: i32,
        color: Color,
    },
    Text {
        text: String,
        x: f32,
        y: f32,
        color: Color,
    },
}

/// Surface that records draw commands in call order.
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Drain the recorded commands, leaving the list empty.
    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn sprite_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Sprite { .. }))
            .count()
    }

    pub fn text_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Text { .. }))
            .count()
    }
}

impl FrameSurface for DrawList {
    fn clear(&mut self, color: Color) {
        self.commands.push(DrawCommand::Clear(color));
    }

    fn draw_sprite(&mut self, transform: &Transform, sprite: &Sprite) {
        self.commands.push(DrawCommand::Sprite {
            image: sprite.image.clone(),
            x: transform.x,
            y: transform.y,
            width: sprite.width,
            height: sprite.height,
            scale_x: transform.scale_x,
            scale_y: transform.scale_y,
            rotation: transform.rotation,
            layer: sprite.layer,
            color: sprite.color,
        });
    }

    fn draw_text(&mut self, text: &Text) {
        self.commands.push(DrawCommand::Text {
            text: text.text.clone(),
            x: text.x,
            y: text.y,
            color: text.color,
        });
    }
}
