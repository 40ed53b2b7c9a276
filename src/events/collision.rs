//! Contact notifications from the collision system.
//!
//! [`CollisionSystem`](crate::systems::collision::CollisionSystem) queues one
//! [`CollisionEvent`] on the [`EventBus`](super::bus::EventBus) for every
//! overlapping pair it finds in a frame. On the bus the event is named
//! [`COLLISION_EVENT`] and carries `{ "a": id, "b": id }` with `a < b`.

use serde_json::json;

use crate::ecs::entity::EntityId;
use crate::events::bus::Event;

pub const COLLISION_EVENT: &str = "collision";

/// Two entities whose colliders overlap. `a` always has the lower id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollisionEvent {
    pub a: EntityId,
    pub b: EntityId,
}

impl CollisionEvent {
    pub fn new(first: EntityId, second: EntityId) -> Self {
        if first <= second {
            Self { a: first, b: second }
        } else {
            Self { a: second, b: first }
        }
    }

    /// `true` if `id` is one of the participants.
    pub fn involves(&self, id: EntityId) -> bool {
        self.a == id || self.b == id
    }

    /// Decode a bus event. Returns `None` for other events or bad payloads.
    pub fn from_event(event: &Event) -> Option<Self> {
        if event.name != COLLISION_EVENT {
            return None;
        }
        let a = event.data.get("a")?.as_u64()?;
        let b = event.data.get("b")?.as_u64()?;
        Some(Self::new(EntityId::from_raw(a), EntityId::from_raw(b)))
    }
}

impl From<CollisionEvent> for Event {
    fn from(value: CollisionEvent) -> Self {
        Event::new(COLLISION_EVENT, json!({ "a": value.a.raw(), "b": value.b.raw() }))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    #[test]
    fn participants_are_ordered_and_survive_the_bus_payload() {
        let hit = CollisionEvent::new(EntityId::from_raw(9), EntityId::from_raw(4));
        assert_eq!(hit.a, EntityId::from_raw(4));
        assert!(hit.involves(EntityId::from_raw(9)));

        let event: Event = hit.into();
        assert_eq!(event.name, COLLISION_EVENT);
        assert_eq!(CollisionEvent::from_event(&event), Some(hit));
        assert_eq!(CollisionEvent::from_event(&Event::new("collision", Value::Null)), None);
        assert_eq!(CollisionEvent::from_event(&Event::new("score", event.data.clone())), None);
    }
}
