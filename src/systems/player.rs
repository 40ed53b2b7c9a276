//! Drives a [`PlayerController`] for every matched entity tagged `"player"`.
//!
//! The controller is created the first time the entity is seen, starting at
//! its transform position, and dropped when the entity leaves the match set.
//! After each update the controller's position is written back into the
//! [`Transform`] and, when present, the sprite image follows the animation.

use rustc_hash::FxHashMap;

use crate::behaviors::player::PlayerController;
use crate::components::sprite::Sprite;
use crate::components::transform::Transform;
use crate::ecs::component::{ComponentKind, ComponentSet};
use crate::ecs::entity::EntityId;
use crate::ecs::error::SystemResult;
use crate::ecs::system::{System, SystemBase, SystemContext, SystemPriority};
use crate::resources::input::InputQuery;

pub const PLAYER_TAG: &str = "player";

/// Input used when the host injects none.
struct NoInput;

impl InputQuery for NoInput {
    fn is_action_active(&self, _action: &str) -> bool {
        false
    }
}

pub struct PlayerSystem {
    base: SystemBase,
    controllers: FxHashMap<EntityId, PlayerController>,
}

impl Default for PlayerSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerSystem {
    pub const NAME: &'static str = "player";

    pub fn new() -> Self {
        Self {
            base: SystemBase::new(
                Self::NAME,
                SystemPriority::UPDATE,
                ComponentSet::of(&[ComponentKind::Transform]),
            ),
            controllers: FxHashMap::default(),
        }
    }

    pub fn controller(&self, id: EntityId) -> Option<&PlayerController> {
        self.controllers.get(&id)
    }
}

impl System for PlayerSystem {
    fn base(&self) -> &SystemBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut SystemBase {
        &mut self.base
    }

    fn on_entity_removed(&mut self, id: EntityId) -> bool {
        self.controllers.remove(&id);
        self.base.matched_mut().remove(id)
    }

    fn update(&mut self, dt: f32, ctx: &mut SystemContext<'_, '_>) -> SystemResult {
        let input = ctx.input().unwrap_or(&NoInput);
        for id in self.base.matched().iter() {
            let tagged = ctx
                .entity(id)
                .is_some_and(|e| e.is_active() && e.has_tag(PLAYER_TAG));
            if !tagged {
                continue;
            }

            if !self.controllers.contains_key(&id) {
                let start = ctx.component::<Transform>(id);
                let controller = PlayerController::new(start.x, start.y)?;
                self.controllers.insert(id, controller);
            }
            let Some(controller) = self.controllers.get_mut(&id) else {
                continue;
            };
            controller.update(input, dt)?;

            let player = controller.player();
            let transform = ctx.component_mut::<Transform>(id);
            transform.x = player.x;
            transform.y = player.y;
            if let Some(sprite) = ctx.entity_mut(id).and_then(|e| e.get_mut::<Sprite>()) {
                sprite.image = format!("player_{}", player.animation);
            }
        }
        Ok(())
    }
}
