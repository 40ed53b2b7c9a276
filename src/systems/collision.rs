//! Pairwise collision detection.
//!
//! Tests every pair of active matched entities whose layers interact and
//! queues a [`CollisionEvent`] on the event bus for each overlap. Pairs are
//! visited in ascending id order, so events arrive in a stable order. The
//! system runs at physics priority and is registered after the physics
//! system, so it sees this frame's positions.

use log::trace;

use crate::components::collider::{Collider, WorldShape};
use crate::components::transform::Transform;
use crate::ecs::component::{ComponentKind, ComponentSet};
use crate::ecs::entity::EntityId;
use crate::ecs::error::SystemResult;
use crate::ecs::system::{System, SystemBase, SystemContext, SystemPriority};
use crate::events::bus::EventSender;
use crate::events::collision::CollisionEvent;

pub struct CollisionSystem {
    base: SystemBase,
    events: EventSender,
    contacts: Vec<CollisionEvent>,
}

impl CollisionSystem {
    pub const NAME: &'static str = "collision";

    pub fn new(events: EventSender) -> Self {
        Self {
            base: SystemBase::new(
                Self::NAME,
                SystemPriority::PHYSICS,
                ComponentSet::of(&[ComponentKind::Transform, ComponentKind::Collider]),
            ),
            events,
            contacts: Vec::new(),
        }
    }

    /// Contacts found by the last update.
    pub fn contacts(&self) -> &[CollisionEvent] {
        &self.contacts
    }
}

impl System for CollisionSystem {
    fn base(&self) -> &SystemBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut SystemBase {
        &mut self.base
    }

    fn update(&mut self, _dt: f32, ctx: &mut SystemContext<'_, '_>) -> SystemResult {
        self.contacts.clear();

        let mut bodies: Vec<(EntityId, Collider, WorldShape)> =
            Vec::with_capacity(self.base.matched().len());
        for id in self.base.matched().iter() {
            if !ctx.entity(id).is_some_and(|e| e.is_active()) {
                continue;
            }
            let transform = ctx.component::<Transform>(id);
            let collider = *ctx.component::<Collider>(id);
            bodies.push((id, collider, collider.world_shape(transform.x, transform.y)));
        }

        for (i, (a, collider_a, shape_a)) in bodies.iter().enumerate() {
            for (b, collider_b, shape_b) in &bodies[i + 1..] {
                if collider_a.interacts_with(collider_b) && shape_a.intersects(shape_b) {
                    trace!("collision between {} and {}", a, b);
                    self.contacts.push(CollisionEvent::new(*a, *b));
                }
            }
        }

        for contact in &self.contacts {
            self.events.send((*contact).into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::bus::EventBus;

    #[test]
    fn requires_transform_and_collider() {
        let bus = EventBus::new();
        let system = CollisionSystem::new(bus.sender());
        let required = system.required_components();
        assert!(required.contains(ComponentKind::Transform));
        assert!(required.contains(ComponentKind::Collider));
        assert_eq!(required.len(), 2);
        assert_eq!(system.priority(), SystemPriority::PHYSICS);
        assert!(system.contacts().is_empty());
    }
}
