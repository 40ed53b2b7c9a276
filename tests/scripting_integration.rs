//! Scripting boundary integration tests: the plain-value bridge and, with the
//! `lua` feature, the `engine` Lua table driving a running world.

use serde_json::json;

use kestrel::components::transform::Transform;
use kestrel::ecs::{ComponentKind, EntityId, World};
use kestrel::scripting::bridge::{BridgeError, EcsBridge};
use kestrel::systems::physics::PhysicsSystem;

const EPSILON: f32 = 1e-5;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

#[test]
fn bridge_spawns_entities_that_systems_pick_up() {
    let mut world = World::new();
    world.add_system(PhysicsSystem::new());

    let id = {
        let mut bridge = EcsBridge::new(&mut world);
        let id = bridge.create_entity();
        bridge.add_tag(id, "bullet");
        bridge.add_component(id, "transform", Some(&json!({"x": 10, "y": 100}))).unwrap();
        bridge.add_component(id, "physics", Some(&json!({"velocity_y": -50.0}))).unwrap();
        id
    };

    world.update(1.0).unwrap();
    let transform = world.component::<Transform>(EntityId::from_raw(id)).unwrap();
    assert!(approx_eq(transform.y, 50.0));

    let bridge = EcsBridge::new(&mut world);
    assert_eq!(bridge.find_by_tag("bullet"), vec![id]);
    assert_eq!(bridge.active_entity_count(), 1);
    assert_eq!(
        bridge.get_component_field(id, "physics", "velocity_y").unwrap(),
        Some(json!(-50.0))
    );
}

#[test]
fn bridge_reports_bad_input() {
    let mut world = World::new();
    let mut bridge = EcsBridge::new(&mut world);
    let id = bridge.create_entity();

    assert!(matches!(
        bridge.add_component(id, "audio", None),
        Err(BridgeError::UnknownKind(_))
    ));
    assert!(matches!(
        bridge.add_component(999, "transform", None),
        Err(BridgeError::UnknownEntity(999))
    ));
    assert!(matches!(
        bridge.add_component(id, "sprite", Some(&json!({"colour": 1}))),
        Err(BridgeError::UnknownField { .. })
    ));
    assert!(matches!(
        bridge.add_component(id, "sprite", Some(&json!({"layer": "top"}))),
        Err(BridgeError::InvalidValue(_))
    ));
    assert_eq!(bridge.get_component(id, "sprite").unwrap(), None);
    assert!(!bridge.has_component(id, "sprite").unwrap());
}

#[test]
fn bridge_deactivation_hides_entity_from_tag_queries() {
    let mut world = World::new();
    let mut bridge = EcsBridge::new(&mut world);
    let a = bridge.create_entity();
    let b = bridge.create_entity();
    bridge.add_tag(a, "enemy");
    bridge.add_tag(b, "enemy");
    assert!(bridge.set_active(a, false));
    assert_eq!(bridge.find_by_tag("enemy"), vec![b]);
    assert_eq!(bridge.total_entities(), 2);
    assert!(bridge.destroy_entity(b));
    assert!(!bridge.set_active(404, true));
}

#[cfg(feature = "lua")]
mod lua {
    use super::*;

    use kestrel::components::physics::Physics;
    use kestrel::components::sprite::Sprite;
    use std::cell::RefCell;
    use std::rc::Rc;

    use kestrel::events::bus::{Event, EventPriority};
    use kestrel::game::{Game, GameError};
    use kestrel::resources::gameconfig::EngineConfig;
    use kestrel::resources::input::InputBindings;
    use kestrel::scripting::lua_runtime::LuaRuntime;

    const SCRIPT: &str = r#"
        local ship = engine.create_entity()
        engine.add_tag(ship, "ship")
        engine.add_component(ship, "transform", { x = 64, y = 200 })
        engine.add_component(ship, "physics", { velocity_y = -60 })
        engine.add_component(ship, "sprite", { image = "ship", layer = 1 })

        frames = 0

        function update(dt)
            frames = frames + 1
            for _, id in ipairs(engine.find_by_tag("ship")) do
                local t = engine.get_component(id, "transform")
                if t.y < 100 then
                    engine.set_component_field(id, "sprite", "image", "ship_high")
                end
            end
        end
    "#;

    #[test]
    fn script_setup_and_update_drive_a_game() {
        let config = EngineConfig {
            fixed_dt: 0.5,
            ..EngineConfig::new()
        };
        let mut game = Game::new(config, InputBindings::default()).unwrap();
        let runtime = LuaRuntime::new(game.world().handle()).unwrap();
        runtime.run_source(SCRIPT, "ship").unwrap();
        assert_eq!(game.world_mut().apply_deferred(), 3);
        game.attach_script(runtime);

        let ship = game.world().find_entities_by_tag("ship")[0];
        for _ in 0..4 {
            game.tick(None).unwrap();
        }

        let transform = game.world().component::<Transform>(ship).unwrap();
        assert!(approx_eq(transform.y, 80.0));
        assert_eq!(game.world().component::<Sprite>(ship).unwrap().image, "ship_high");

        let frames: i64 = game.script().unwrap().lua().globals().get("frames").unwrap();
        assert_eq!(frames, 4);
    }

    #[test]
    fn script_component_changes_apply_after_the_call() {
        let mut world = World::new();
        let id = world.create_entity();
        world.add_component(id, Physics::new()).unwrap();
        world.update(0.0).unwrap();

        let runtime = LuaRuntime::new(world.handle()).unwrap();
        runtime
            .run_source(
                &format!(
                    r#"
                    engine.remove_component({id}, "physics")
                    engine.add_component({id}, "screen_config", {{ width = 800, height = 600 }})
                    still_has_physics = engine.has_component({id}, "physics")
                    "#,
                    id = id.raw()
                ),
                "queue",
            )
            .unwrap();

        let still: bool = runtime.lua().globals().get("still_has_physics").unwrap();
        assert!(still);
        assert_eq!(world.apply_deferred(), 2);
        assert!(!world.has_component(id, ComponentKind::Physics));
        let screen = world.get_component(id, ComponentKind::ScreenConfig).unwrap();
        assert_eq!(
            screen,
            kestrel::ecs::Component::ScreenConfig(kestrel::components::screenconfig::ScreenConfig::new(800, 600))
        );
    }

    #[test]
    fn script_reads_and_edits_in_place() {
        let mut world = World::new();
        let id = world.create_entity();
        world.add_component(id, Transform::new(1.0, 2.0)).unwrap();
        world.update(0.0).unwrap();

        let runtime = LuaRuntime::new(world.handle()).unwrap();
        let x: f64 = runtime
            .lua()
            .load(format!(
                r#"
                local id = {}
                engine.set_component(id, "transform", {{ x = 5, rotation = 90 }})
                engine.set_active(id, false)
                return engine.get_component(id, "transform").x
                "#,
                id.raw()
            ))
            .eval()
            .unwrap();

        assert_eq!(x, 5.0);
        assert!(!world.is_active(id));
        let transform = world.component::<Transform>(id).unwrap();
        assert!(approx_eq(transform.rotation, 90.0));
        assert!(approx_eq(transform.y, 2.0));
    }

    #[test]
    fn script_errors_surface_as_lua_errors() {
        let mut world = World::new();
        let id = world.create_entity();
        world.add_component(id, Transform::default()).unwrap();

        let runtime = LuaRuntime::new(world.handle()).unwrap();
        let not_a_table = format!("engine.set_component({}, 'transform', 5)", id.raw());
        assert!(runtime.run_source(&not_a_table, "bad").is_err());
        assert!(runtime.run_source("engine.get_component(1, 'audio')", "bad").is_err());
        let updated: bool = runtime
            .lua()
            .load("return engine.set_component(99, 'transform', { x = 1 })")
            .eval()
            .unwrap();
        assert!(!updated);
    }

    #[test]
    fn failing_script_update_fails_the_tick_after_applying_its_commands() {
        let mut game = Game::new(EngineConfig::new(), InputBindings::default()).unwrap();
        let runtime = LuaRuntime::new(game.world().handle()).unwrap();
        runtime
            .run_source(
                r#"
                function update(dt)
                    local id = engine.create_entity()
                    engine.add_tag(id, "debris")
                    engine.add_component(id, "transform", { x = 1, y = 1 })
                    error("boom")
                end
                "#,
                "failing",
            )
            .unwrap();
        game.attach_script(runtime);

        let err = game.tick(None).unwrap_err();
        assert!(matches!(err, GameError::Script(_)));
        let debris = game.world().find_entities_by_tag("debris");
        assert_eq!(debris.len(), 1);
        assert!(game.world().has_component(debris[0], ComponentKind::Transform));
    }

    #[test]
    fn script_events_reach_bus_handlers_in_the_same_tick() {
        let mut game = Game::new(EngineConfig::new(), InputBindings::default()).unwrap();
        let opened: Rc<RefCell<Vec<serde_json::Value>>> = Rc::default();
        let sink = Rc::clone(&opened);
        game.events_mut()
            .subscribe("door_opened", EventPriority::Normal, move |event: &Event| {
                sink.borrow_mut().push(event.data.clone());
                Ok(())
            });

        let runtime = LuaRuntime::new(game.world().handle()).unwrap();
        runtime
            .run_source(
                r#"
                function update(dt)
                    engine.emit_event("door_opened", { door = 3, key = "red" })
                end
                "#,
                "doors",
            )
            .unwrap();
        game.attach_script(runtime);

        game.tick(None).unwrap();
        assert_eq!(*opened.borrow(), vec![json!({"door": 3, "key": "red"})]);
    }
}
