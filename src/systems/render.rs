//! Sprite drawing.
//!
//! Draws every matched entity with a non-empty image key onto the injected
//! frame surface, lowest layer first and by ascending id within a layer.
//! Without a surface the system does nothing.

use crate::components::sprite::Sprite;
use crate::components::transform::Transform;
use crate::ecs::component::{ComponentKind, ComponentSet};
use crate::ecs::entity::EntityId;
use crate::ecs::error::SystemResult;
use crate::ecs::system::{System, SystemBase, SystemContext, SystemPriority};

pub struct RenderSystem {
    base: SystemBase,
    // Reused between frames.
    order: Vec<(i32, EntityId)>,
}

impl Default for RenderSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSystem {
    pub const NAME: &'static str = "render";

    pub fn new() -> Self {
        Self {
            base: SystemBase::new(
                Self::NAME,
                SystemPriority::RENDER,
                ComponentSet::of(&[ComponentKind::Transform, ComponentKind::Sprite]),
            ),
            order: Vec::new(),
        }
    }
}

impl System for RenderSystem {
    fn base(&self) -> &SystemBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut SystemBase {
        &mut self.base
    }

    fn update(&mut self, _dt: f32, ctx: &mut SystemContext<'_, '_>) -> SystemResult {
        if !ctx.has_surface() {
            return Ok(());
        }

        self.order.clear();
        for id in self.base.matched().iter() {
            let sprite = ctx.component::<Sprite>(id);
            if sprite.image.is_empty() {
                continue;
            }
            self.order.push((sprite.layer, id));
        }
        self.order.sort_unstable();

        let (registry, surface) = ctx.split();
        let Some(surface) = surface else {
            return Ok(());
        };
        for (_, id) in &self.order {
            let Some(entity) = registry.get(*id) else {
                continue;
            };
            if let (Some(transform), Some(sprite)) = (entity.get::<Transform>(), entity.get::<Sprite>()) {
                surface.draw_sprite(transform, sprite);
            }
        }
        Ok(())
    }
}
