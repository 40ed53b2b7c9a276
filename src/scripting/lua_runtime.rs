//! Lua scripting runtime.
//!
//! Exposes an `engine` table to scripts. Reads go straight to the shared
//! registry under its read lock. Entity creation and destruction use the
//! world's deferred queues, and component attach/detach is queued as well;
//! the host applies those commands with [`World::apply_deferred`] right after
//! the script call returns. Tags, the active flag and fields of components
//! that are already attached are edited in place. Once the host hands the
//! runtime an [`EventSender`], `engine.emit_event(name, data)` queues events
//! for the next bus dispatch.
//!
//! # Example
//!
//! ```lua
//! local id = engine.create_entity()
//! engine.add_tag(id, "bullet")
//! engine.add_component(id, "transform", { x = 400, y = 300 })
//! engine.add_component(id, "physics", { velocity_y = -240 })
//!
//! function update(dt)
//!     engine.log_info("bullets: " .. #engine.find_by_tag("bullet"))
//! end
//! ```
//!
//! [`World::apply_deferred`]: crate::ecs::world::World::apply_deferred

use std::path::Path;

use log::{error, info, warn};
use mlua::prelude::*;
use serde_json::Value;

use crate::ecs::entity::EntityId;
use crate::ecs::world::WorldHandle;
use crate::events::bus::{Event, EventSender};
use crate::scripting::bridge::{
    BridgeError, component_from_fields, component_to_value, merge_fields, normalized, parse_kind,
    set_field,
};

/// Name of the optional per-frame callback.
pub const UPDATE_CALLBACK: &str = "update";

/// Shared state reachable from the Lua closures through `app_data`.
struct LuaAppData {
    world: WorldHandle,
    events: Option<EventSender>,
}

fn world(lua: &Lua) -> LuaResult<WorldHandle> {
    lua.app_data_ref::<LuaAppData>()
        .map(|data| data.world.clone())
        .ok_or_else(|| LuaError::runtime("LuaAppData not found"))
}

fn events(lua: &Lua) -> LuaResult<EventSender> {
    lua.app_data_ref::<LuaAppData>()
        .and_then(|data| data.events.clone())
        .ok_or_else(|| LuaError::runtime("no event bus attached"))
}

fn bridge_err(err: BridgeError) -> LuaError {
    LuaError::external(err)
}

fn lua_to_json(lua: &Lua, value: LuaValue) -> LuaResult<Value> {
    lua.from_value(value)
}

/// Lua interpreter bound to one world.
///
/// `Lua` is not `Send`; keep the runtime on the thread that drives the frame loop.
pub struct LuaRuntime {
    lua: Lua,
}

impl LuaRuntime {
    /// Creates a runtime and registers the `engine` table.
    ///
    /// # Errors
    ///
    /// Returns an error if registering the API fails.
    pub fn new(world: WorldHandle) -> LuaResult<Self> {
        let lua = Lua::new();
        lua.set_app_data(LuaAppData { world, events: None });

        let runtime = Self { lua };
        let engine = runtime.lua.create_table()?;
        runtime.register_log_api(&engine)?;
        runtime.register_entity_api(&engine)?;
        runtime.register_component_api(&engine)?;
        runtime.register_event_api(&engine)?;
        runtime.lua.globals().set("engine", engine)?;

        Ok(runtime)
    }

    fn register_log_api(&self, engine: &LuaTable) -> LuaResult<()> {
        engine.set(
            "log",
            self.lua.create_function(|_, msg: String| {
                info!(target: "lua", "{}", msg);
                Ok(())
            })?,
        )?;
        engine.set(
            "log_info",
            self.lua.create_function(|_, msg: String| {
                info!(target: "lua", "{}", msg);
                Ok(())
            })?,
        )?;
        engine.set(
            "log_warn",
            self.lua.create_function(|_, msg: String| {
                warn!(target: "lua", "{}", msg);
                Ok(())
            })?,
        )?;
        engine.set(
            "log_error",
            self.lua.create_function(|_, msg: String| {
                error!(target: "lua", "{}", msg);
                Ok(())
            })?,
        )?;
        Ok(())
    }

    fn register_entity_api(&self, engine: &LuaTable) -> LuaResult<()> {
        // engine.create_entity() -> id
        engine.set(
            "create_entity",
            self.lua
                .create_function(|lua, ()| Ok(world(lua)?.create_entity().raw()))?,
        )?;

        // engine.destroy_entity(id) -> bool
        engine.set(
            "destroy_entity",
            self.lua.create_function(|lua, id: u64| {
                Ok(world(lua)?.destroy_entity(EntityId::from_raw(id)))
            })?,
        )?;

        engine.set(
            "add_tag",
            self.lua.create_function(|lua, (id, tag): (u64, String)| {
                Ok(world(lua)?
                    .with_entity(EntityId::from_raw(id), |e| e.add_tag(tag))
                    .is_some())
            })?,
        )?;

        engine.set(
            "remove_tag",
            self.lua.create_function(|lua, (id, tag): (u64, String)| {
                Ok(world(lua)?
                    .with_entity(EntityId::from_raw(id), |e| e.remove_tag(&tag))
                    .unwrap_or(false))
            })?,
        )?;

        engine.set(
            "has_tag",
            self.lua.create_function(|lua, (id, tag): (u64, String)| {
                Ok(world(lua)?.read().has_tag(EntityId::from_raw(id), &tag))
            })?,
        )?;

        // engine.set_active(id, bool) -> bool
        engine.set(
            "set_active",
            self.lua.create_function(|lua, (id, active): (u64, bool)| {
                Ok(world(lua)?
                    .with_entity(EntityId::from_raw(id), |e| {
                        if active {
                            e.activate()
                        } else {
                            e.deactivate()
                        }
                    })
                    .is_some())
            })?,
        )?;

        engine.set(
            "is_active",
            self.lua.create_function(|lua, id: u64| {
                Ok(world(lua)?.read().is_active(EntityId::from_raw(id)))
            })?,
        )?;

        // engine.find_by_tag(tag) -> { id, ... }
        engine.set(
            "find_by_tag",
            self.lua.create_function(|lua, tag: String| {
                let ids: Vec<u64> = world(lua)?
                    .read()
                    .find_entities_by_tag(&tag)
                    .into_iter()
                    .map(EntityId::raw)
                    .collect();
                lua.create_sequence_from(ids)
            })?,
        )?;

        engine.set(
            "active_entity_count",
            self.lua
                .create_function(|lua, ()| Ok(world(lua)?.read().active_entity_count()))?,
        )?;

        engine.set(
            "total_entities",
            self.lua
                .create_function(|lua, ()| Ok(world(lua)?.read().total_entities()))?,
        )?;

        Ok(())
    }

    fn register_component_api(&self, engine: &LuaTable) -> LuaResult<()> {
        // engine.add_component(id, kind, fields?) -> bool, applied after the script call
        engine.set(
            "add_component",
            self.lua.create_function(
                |lua, (id, kind, fields): (u64, String, Option<LuaValue>)| {
                    let kind = parse_kind(&kind).map_err(bridge_err)?;
                    let fields = fields.map(|v| lua_to_json(lua, v)).transpose()?;
                    let component = component_from_fields(kind, fields.as_ref()).map_err(bridge_err)?;
                    Ok(world(lua)?.queue_add_component(EntityId::from_raw(id), component))
                },
            )?,
        )?;

        // engine.remove_component(id, kind) -> bool, applied after the script call
        engine.set(
            "remove_component",
            self.lua.create_function(|lua, (id, kind): (u64, String)| {
                let kind = parse_kind(&kind).map_err(bridge_err)?;
                Ok(world(lua)?.queue_remove_component(EntityId::from_raw(id), kind))
            })?,
        )?;

        engine.set(
            "has_component",
            self.lua.create_function(|lua, (id, kind): (u64, String)| {
                let kind = parse_kind(&kind).map_err(bridge_err)?;
                Ok(world(lua)?.read().has_component(EntityId::from_raw(id), kind))
            })?,
        )?;

        // engine.get_component(id, kind) -> table | nil
        engine.set(
            "get_component",
            self.lua.create_function(|lua, (id, kind): (u64, String)| {
                let kind = parse_kind(&kind).map_err(bridge_err)?;
                let Some(component) = world(lua)?.read().get_component(EntityId::from_raw(id), kind) else {
                    return Ok(LuaValue::Nil);
                };
                let value = component_to_value(&component).map_err(bridge_err)?;
                lua.to_value(&value)
            })?,
        )?;

        // engine.set_component(id, kind, fields) -> bool
        engine.set(
            "set_component",
            self.lua.create_function(|lua, (id, kind, fields): (u64, String, LuaValue)| {
                let kind = parse_kind(&kind).map_err(bridge_err)?;
                let fields = lua_to_json(lua, fields)?;
                let outcome = world(lua)?.with_component(EntityId::from_raw(id), kind, |mut slot| {
                    let updated = merge_fields(slot.get(), &fields)?;
                    Ok::<bool, BridgeError>(slot.replace(updated))
                });
                match outcome {
                    Some(result) => result.map_err(bridge_err),
                    None => Ok(false),
                }
            })?,
        )?;

        // engine.set_component_field(id, kind, field, value) -> bool
        engine.set(
            "set_component_field",
            self.lua.create_function(
                |lua, (id, kind, field, value): (u64, String, String, LuaValue)| {
                    let kind = parse_kind(&kind).map_err(bridge_err)?;
                    let value = lua_to_json(lua, value)?;
                    let outcome = world(lua)?.with_component(EntityId::from_raw(id), kind, |mut slot| {
                        let updated = set_field(slot.get(), &field, &value)?;
                        Ok::<bool, BridgeError>(slot.replace(updated))
                    });
                    match outcome {
                        Some(result) => result.map_err(bridge_err),
                        None => Ok(false),
                    }
                },
            )?,
        )?;

        Ok(())
    }

    fn register_event_api(&self, engine: &LuaTable) -> LuaResult<()> {
        // engine.emit_event(name, data?) -> bool
        engine.set(
            "emit_event",
            self.lua
                .create_function(|lua, (name, data): (String, Option<LuaValue>)| {
                    let data = match data {
                        Some(value) => normalized(&lua_to_json(lua, value)?),
                        None => Value::Null,
                    };
                    Ok(events(lua)?.send(Event::new(name, data)))
                })?,
        )?;
        Ok(())
    }

    /// Route `engine.emit_event` to `sender`.
    pub fn set_event_sender(&self, sender: EventSender) {
        if let Some(mut data) = self.lua.app_data_mut::<LuaAppData>() {
            data.events = Some(sender);
        }
    }

    /// Loads and executes a Lua script from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the script fails.
    pub fn run_script(&self, path: &Path) -> LuaResult<()> {
        let script = std::fs::read_to_string(path).map_err(LuaError::external)?;
        self.lua.load(&script).set_name(path.display().to_string()).exec()
    }

    /// Executes a chunk of Lua source.
    pub fn run_source(&self, source: &str, name: &str) -> LuaResult<()> {
        self.lua.load(source).set_name(name).exec()
    }

    /// Calls a global Lua function by name with the given arguments.
    pub fn call_function<A, R>(&self, name: &str, args: A) -> LuaResult<R>
    where
        A: IntoLuaMulti,
        R: FromLuaMulti,
    {
        let func: LuaFunction = self.lua.globals().get(name)?;
        func.call(args)
    }

    /// Checks if a global function exists.
    pub fn has_function(&self, name: &str) -> bool {
        self.lua.globals().get::<LuaFunction>(name).is_ok()
    }

    /// Calls the script's `update(dt)` if it defines one. Returns whether it ran.
    pub fn call_update(&self, dt: f32) -> LuaResult<bool> {
        if !self.has_function(UPDATE_CALLBACK) {
            return Ok(false);
        }
        self.call_function::<_, ()>(UPDATE_CALLBACK, dt)?;
        Ok(true)
    }

    /// Returns a reference to the underlying Lua state.
    pub fn lua(&self) -> &Lua {
        &self.lua
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::transform::Transform;
    use crate::ecs::component::ComponentKind;
    use crate::ecs::world::World;
    use crate::events::bus::EventBus;

    #[test]
    fn engine_table_is_registered() {
        let world = World::new();
        let runtime = LuaRuntime::new(world.handle()).unwrap();
        let has_log: bool = runtime
            .lua()
            .load("return type(engine.log) == 'function'")
            .eval()
            .unwrap();
        assert!(has_log);
        assert!(!runtime.has_function(UPDATE_CALLBACK));
        assert!(!runtime.call_update(0.1).unwrap());
    }

    #[test]
    fn component_attach_waits_for_apply() {
        let mut world = World::new();
        let runtime = LuaRuntime::new(world.handle()).unwrap();
        let id: u64 = runtime
            .lua()
            .load(
                r#"
                local id = engine.create_entity()
                engine.add_component(id, "transform", { x = 12, y = 3 })
                return id
                "#,
            )
            .eval()
            .unwrap();
        let id = EntityId::from_raw(id);
        assert!(!world.has_component(id, ComponentKind::Transform));
        world.apply_deferred();
        assert_eq!(world.component::<Transform>(id).unwrap().x, 12.0);
    }

    #[test]
    fn emit_event_needs_a_sender_and_queues_on_the_bus() {
        let world = World::new();
        let runtime = LuaRuntime::new(world.handle()).unwrap();
        assert!(runtime.run_source("engine.emit_event('door_opened')", "early").is_err());

        let bus = EventBus::new();
        runtime.set_event_sender(bus.sender());
        runtime
            .run_source("engine.emit_event('door_opened', { door = 3 })", "emit")
            .unwrap();
        assert_eq!(bus.queued_len(), 1);
    }

    #[test]
    fn unknown_kind_raises_a_lua_error() {
        let world = World::new();
        let runtime = LuaRuntime::new(world.handle()).unwrap();
        let result = runtime.run_source("engine.add_component(1, 'audio')", "bad");
        assert!(result.is_err());
    }
}
