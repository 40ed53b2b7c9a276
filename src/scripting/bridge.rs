//! Plain-value scripting boundary.
//!
//! Scripts only ever see integers, strings and JSON-like values. Entity ids
//! cross the boundary as `u64`, component kinds as their names
//! (`"transform"`, `"screen_config"`, ...) and component data as objects of
//! fields:
//!
//! ```json
//! { "x": 10.0, "y": 20.0, "scale_x": 1.0, "scale_y": 1.0, "rotation": 0.0 }
//! ```
//!
//! [`EcsBridge`] applies every operation to a [`World`] immediately. The
//! free functions convert between [`Component`] and field objects and are
//! shared with the Lua runtime.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::ecs::component::{Component, ComponentKind};
use crate::ecs::entity::EntityId;
use crate::ecs::error::EcsError;
use crate::ecs::world::World;

const KIND_FIELD: &str = "kind";

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("unknown component kind `{0}`")]
    UnknownKind(String),

    #[error("unknown entity {0}")]
    UnknownEntity(u64),

    #[error("entity {entity} has no {kind} component")]
    MissingComponent { entity: u64, kind: ComponentKind },

    #[error("{kind} has no field `{field}`")]
    UnknownField { kind: ComponentKind, field: String },

    #[error("component fields must be an object, got {0}")]
    NotAnObject(Value),

    #[error("invalid component value: {0}")]
    InvalidValue(#[from] serde_json::Error),

    #[error(transparent)]
    Ecs(#[from] EcsError),
}

pub type BridgeResult<T> = Result<T, BridgeError>;

pub fn parse_kind(name: &str) -> BridgeResult<ComponentKind> {
    ComponentKind::from_name(name).ok_or_else(|| BridgeError::UnknownKind(name.to_string()))
}

/// Field object of a component, without the kind tag.
pub fn component_to_value(component: &Component) -> BridgeResult<Value> {
    let mut value = serde_json::to_value(component)?;
    if let Value::Object(fields) = &mut value {
        fields.remove(KIND_FIELD);
    }
    Ok(value)
}

/// Build a component of `kind` from its defaults overlaid with `fields`.
pub fn component_from_fields(kind: ComponentKind, fields: Option<&Value>) -> BridgeResult<Component> {
    let base = Component::default_of(kind);
    match fields {
        None | Some(Value::Null) => Ok(base),
        Some(fields) => merge_fields(&base, fields),
    }
}

/// Copy of `component` with the given fields replaced. Unknown field names
/// are rejected so that typos do not pass silently.
pub fn merge_fields(component: &Component, fields: &Value) -> BridgeResult<Component> {
    let Value::Object(updates) = fields else {
        return Err(BridgeError::NotAnObject(fields.clone()));
    };
    let kind = component.kind();
    let mut current = into_object(serde_json::to_value(component)?);
    for (field, value) in updates {
        if field == KIND_FIELD {
            continue;
        }
        match current.get_mut(field) {
            Some(slot) => *slot = normalized(value),
            None => {
                return Err(BridgeError::UnknownField {
                    kind,
                    field: field.clone(),
                });
            }
        }
    }
    current.insert(KIND_FIELD.to_string(), Value::from(kind.name()));
    Ok(serde_json::from_value(Value::Object(current))?)
}

/// Copy of `component` with a single field replaced.
pub fn set_field(component: &Component, field: &str, value: &Value) -> BridgeResult<Component> {
    let mut update = Map::new();
    update.insert(field.to_string(), value.clone());
    merge_fields(component, &Value::Object(update))
}

/// Turn integral floating point numbers into integers, recursively.
///
/// Scripting languages without an integer type hand over `1920.0` where an
/// unsigned field expects `1920`.
pub fn normalized(value: &Value) -> Value {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < (1u64 << 53) as f64 => {
                Value::from(f as i64)
            }
            _ => value.clone(),
        },
        Value::Array(items) => Value::Array(items.iter().map(normalized).collect()),
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), normalized(v)))
                .collect(),
        ),
        _ => value.clone(),
    }
}

fn into_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(fields) => fields,
        _ => Map::new(),
    }
}

/// Immediate plain-value access to a world.
pub struct EcsBridge<'w> {
    world: &'w mut World,
}

impl<'w> EcsBridge<'w> {
    pub fn new(world: &'w mut World) -> Self {
        Self { world }
    }

    pub fn create_entity(&mut self) -> u64 {
        self.world.create_entity().raw()
    }

    pub fn destroy_entity(&mut self, id: u64) -> bool {
        self.world.destroy_entity(EntityId::from_raw(id))
    }

    /// Attach a component built from defaults plus `fields`.
    pub fn add_component(&mut self, id: u64, kind: &str, fields: Option<&Value>) -> BridgeResult<()> {
        let kind = parse_kind(kind)?;
        let entity = self.known(id)?;
        let component = component_from_fields(kind, fields)?;
        self.world.add_component(entity, component)?;
        Ok(())
    }

    /// `Ok(None)` when the entity is unknown or lacks the component.
    pub fn get_component(&self, id: u64, kind: &str) -> BridgeResult<Option<Value>> {
        let kind = parse_kind(kind)?;
        self.world
            .get_component(EntityId::from_raw(id), kind)
            .map(|c| component_to_value(&c))
            .transpose()
    }

    pub fn get_component_field(&self, id: u64, kind: &str, field: &str) -> BridgeResult<Option<Value>> {
        let Some(value) = self.get_component(id, kind)? else {
            return Ok(None);
        };
        match value.get(field) {
            Some(v) => Ok(Some(v.clone())),
            None => Err(BridgeError::UnknownField {
                kind: parse_kind(kind)?,
                field: field.to_string(),
            }),
        }
    }

    /// Overwrite some fields of an attached component.
    pub fn set_component(&mut self, id: u64, kind: &str, fields: &Value) -> BridgeResult<()> {
        let kind = parse_kind(kind)?;
        let entity = self.known(id)?;
        let current = self
            .world
            .get_component(entity, kind)
            .ok_or(BridgeError::MissingComponent { entity: id, kind })?;
        let updated = merge_fields(&current, fields)?;
        if let Some(mut target) = self.world.entity_mut(entity) {
            if let Some(mut slot) = target.get_component_mut(kind) {
                slot.replace(updated);
            }
        }
        Ok(())
    }

    pub fn set_component_field(&mut self, id: u64, kind: &str, field: &str, value: &Value) -> BridgeResult<()> {
        let mut update = Map::new();
        update.insert(field.to_string(), value.clone());
        self.set_component(id, kind, &Value::Object(update))
    }

    /// `Ok(false)` when the entity is unknown or lacks the component.
    pub fn remove_component(&mut self, id: u64, kind: &str) -> BridgeResult<bool> {
        let kind = parse_kind(kind)?;
        match self.world.remove_component(EntityId::from_raw(id), kind) {
            Ok(removed) => Ok(removed),
            Err(EcsError::UnknownEntity(_)) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    pub fn has_component(&self, id: u64, kind: &str) -> BridgeResult<bool> {
        Ok(self.world.has_component(EntityId::from_raw(id), parse_kind(kind)?))
    }

    pub fn add_tag(&mut self, id: u64, tag: &str) -> bool {
        self.world.add_tag(EntityId::from_raw(id), tag).is_ok()
    }

    pub fn remove_tag(&mut self, id: u64, tag: &str) -> bool {
        self.world.remove_tag(EntityId::from_raw(id), tag).unwrap_or(false)
    }

    pub fn has_tag(&self, id: u64, tag: &str) -> bool {
        self.world.has_tag(EntityId::from_raw(id), tag)
    }

    pub fn set_active(&mut self, id: u64, active: bool) -> bool {
        let entity = EntityId::from_raw(id);
        let result = if active {
            self.world.activate(entity)
        } else {
            self.world.deactivate(entity)
        };
        result.is_ok()
    }

    pub fn find_by_tag(&self, tag: &str) -> Vec<u64> {
        self.world
            .find_entities_by_tag(tag)
            .into_iter()
            .map(EntityId::raw)
            .collect()
    }

    pub fn active_entity_count(&self) -> usize {
        self.world.active_entity_count()
    }

    pub fn total_entities(&self) -> usize {
        self.world.total_entities()
    }

    fn known(&self, id: u64) -> BridgeResult<EntityId> {
        let entity = EntityId::from_raw(id);
        if self.world.contains(entity) {
            Ok(entity)
        } else {
            Err(BridgeError::UnknownEntity(id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn component_values_carry_no_kind_tag() {
        let value = component_to_value(&Component::default_of(ComponentKind::ScreenConfig)).unwrap();
        assert_eq!(value, json!({"width": 1280, "height": 720}));
    }

    #[test]
    fn fields_overlay_defaults() {
        let c = component_from_fields(ComponentKind::Physics, Some(&json!({"gravity": 9.8}))).unwrap();
        let Component::Physics(p) = c else {
            panic!("expected physics");
        };
        assert!((p.gravity - 9.8).abs() < 1e-6);
        assert_eq!(p.speed, 3.0);
    }

    #[test]
    fn integral_floats_fit_unsigned_fields() {
        let c = component_from_fields(ComponentKind::ScreenConfig, Some(&json!({"width": 1920.0}))).unwrap();
        assert_eq!(c, Component::ScreenConfig(crate::components::screenconfig::ScreenConfig::new(1920, 720)));
    }

    #[test]
    fn unknown_field_and_kind_are_rejected() {
        assert!(matches!(
            component_from_fields(ComponentKind::Text, Some(&json!({"font": "x"}))),
            Err(BridgeError::UnknownField { .. })
        ));
        assert!(matches!(parse_kind("audio"), Err(BridgeError::UnknownKind(_))));
        assert!(matches!(
            component_from_fields(ComponentKind::Text, Some(&json!(3))),
            Err(BridgeError::NotAnObject(_))
        ));
    }

    #[test]
    fn bridge_round_trips_through_the_world() {
        let mut world = World::new();
        let mut bridge = EcsBridge::new(&mut world);
        let id = bridge.create_entity();
        bridge.add_component(id, "transform", Some(&json!({"x": 5}))).unwrap();
        bridge.set_component_field(id, "transform", "y", &json!(7.5)).unwrap();
        assert_eq!(bridge.get_component_field(id, "transform", "x").unwrap(), Some(json!(5.0)));
        assert_eq!(bridge.get_component_field(id, "transform", "y").unwrap(), Some(json!(7.5)));
        assert!(bridge.add_tag(id, "enemy"));
        assert_eq!(bridge.find_by_tag("enemy"), vec![id]);
        assert!(bridge.remove_component(id, "transform").unwrap());
        assert_eq!(bridge.get_component(id, "transform").unwrap(), None);
        assert!(!bridge.remove_component(999, "transform").unwrap());
        assert!(matches!(
            bridge.set_component(id, "sprite", &json!({})),
            Err(BridgeError::MissingComponent { .. })
        ));
    }
}
