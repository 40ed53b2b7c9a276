//! Text drawing. Runs right after the sprite pass so text sits on top.

use crate::components::text::Text;
use crate::ecs::component::{ComponentKind, ComponentSet};
use crate::ecs::entity::EntityId;
use crate::ecs::error::SystemResult;
use crate::ecs::system::{System, SystemBase, SystemContext, SystemPriority};

pub struct TextSystem {
    base: SystemBase,
    visible: Vec<EntityId>,
}

impl Default for TextSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl TextSystem {
    pub const NAME: &'static str = "text";

    pub fn new() -> Self {
        Self {
            base: SystemBase::new(
                Self::NAME,
                SystemPriority::RENDER.next(),
                ComponentSet::of(&[ComponentKind::Text]),
            ),
            visible: Vec::new(),
        }
    }
}

impl System for TextSystem {
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

        self.visible.clear();
        for id in self.base.matched().iter() {
            if ctx.component::<Text>(id).visible {
                self.visible.push(id);
            }
        }

        let (registry, surface) = ctx.split();
        let Some(surface) = surface else {
            return Ok(());
        };
        for id in &self.visible {
            if let Some(text) = registry.get(*id).and_then(|e| e.get::<Text>()) {
                surface.draw_text(text);
            }
        }
        Ok(())
    }
}
