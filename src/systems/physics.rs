//! Semi-implicit Euler integration.
//!
//! Every matched entity first has its vertical velocity advanced by gravity,
//! then its position advanced by the new velocity. Entities whose `y` leaves
//! the configured [`PhysicsBounds`] are deactivated and lose the despawn tag,
//! so tag-based counts stop seeing them; the periodic cleanup erases them.

use log::debug;

use crate::components::physics::Physics;
use crate::components::transform::Transform;
use crate::ecs::component::{ComponentKind, ComponentSet};
use crate::ecs::error::SystemResult;
use crate::ecs::system::{System, SystemBase, SystemContext, SystemPriority};
use crate::resources::gameconfig::PhysicsBounds;

pub struct PhysicsSystem {
    base: SystemBase,
    bounds: PhysicsBounds,
}

impl Default for PhysicsSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsSystem {
    pub const NAME: &'static str = "physics";

    pub fn new() -> Self {
        Self::with_bounds(PhysicsBounds::default())
    }

    pub fn with_bounds(bounds: PhysicsBounds) -> Self {
        Self {
            base: SystemBase::new(
                Self::NAME,
                SystemPriority::PHYSICS,
                ComponentSet::of(&[ComponentKind::Transform, ComponentKind::Physics]),
            ),
            bounds,
        }
    }

    pub fn bounds(&self) -> &PhysicsBounds {
        &self.bounds
    }
}

impl System for PhysicsSystem {
    fn base(&self) -> &SystemBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut SystemBase {
        &mut self.base
    }

    fn update(&mut self, dt: f32, ctx: &mut SystemContext<'_, '_>) -> SystemResult {
        for id in self.base.matched().iter() {
            let (dx, dy) = ctx.component_mut::<Physics>(id).integrate(dt);
            let transform = ctx.component_mut::<Transform>(id);
            transform.translate(dx, dy);
            let y = transform.y;

            if !self.bounds.contains(y) {
                if let Some(entity) = ctx.entity_mut(id) {
                    if entity.is_active() {
                        debug!("entity {} left the play area at y={}", id, y);
                    }
                    entity.deactivate();
                    entity.remove_tag(&self.bounds.despawn_tag);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_transform_and_physics() {
        let system = PhysicsSystem::new();
        let required = system.required_components();
        assert!(required.contains(ComponentKind::Transform));
        assert!(required.contains(ComponentKind::Physics));
        assert_eq!(required.len(), 2);
        assert_eq!(system.priority(), SystemPriority::PHYSICS);
    }
}
