//! Game host: owns the world, the default systems and the frame loop.
//!
//! Each [`Game::tick`]:
//!
//! 1. advances [`WorldTime`] by the configured fixed step
//! 2. clears the surface (if any) and runs one [`World::frame`] with the
//!    surface and the current [`InputState`]
//! 3. runs the script's `update(dt)` (with the `lua` feature) and applies the
//!    component commands it queued
//! 4. dispatches the events queued on the [`EventBus`] (collisions, script
//!    events, delayed events that came due)
//! 5. drains [`ScreenResized`] events into [`ScreenSize`]
//! 6. every `cleanup_interval` frames, erases inactive entities
//!
//! A failing system, script `update` or event handler ends the tick with an
//! error and skips the remaining steps. Commands and events queued before the
//! failure are kept and take effect on the next tick.

use crossbeam_channel::Receiver;
use log::{debug, info, trace};
use thiserror::Error;

use crate::components::screenconfig::ScreenConfig;
use crate::components::sprite::Color;
use crate::ecs::entity::EntityId;
use crate::ecs::error::{EcsError, EcsResult};
use crate::ecs::system::FrameIo;
use crate::ecs::world::World;
use crate::events::bus::{EventBus, EventError, EventSender};
use crate::events::screen::{ScreenResized, screen_channel};
use crate::resources::gameconfig::{ConfigError, EngineConfig};
use crate::resources::input::{InputBindings, InputState};
use crate::resources::screensize::ScreenSize;
use crate::resources::surface::FrameSurface;
use crate::resources::worldtime::WorldTime;
use crate::systems::collision::CollisionSystem;
use crate::systems::physics::PhysicsSystem;
use crate::systems::player::PlayerSystem;
use crate::systems::render::RenderSystem;
use crate::systems::screenconfig::ScreenConfigSystem;
use crate::systems::text::TextSystem;

#[cfg(feature = "lua")]
use crate::scripting::lua_runtime::LuaRuntime;

pub const SCREEN_CONFIG_TAG: &str = "screen_config";

#[derive(Error, Debug)]
pub enum GameError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Ecs(#[from] EcsError),

    #[error(transparent)]
    Event(#[from] EventError),

    #[cfg(feature = "lua")]
    #[error("script update failed: {0}")]
    Script(#[from] mlua::Error),
}

/// Spawn the entity holding the screen resolution, tagged `"screen_config"`.
pub fn spawn_screen_config(world: &mut World, config: ScreenConfig) -> EcsResult<EntityId> {
    let id = world.create_entity();
    world.add_tag(id, SCREEN_CONFIG_TAG)?;
    world.add_component(id, config)?;
    Ok(id)
}

/// Register physics, collision, player, screen, render and text systems.
/// Collisions are queued on `events`.
pub fn register_default_systems(
    world: &mut World,
    config: &EngineConfig,
    events: &EventSender,
) -> Receiver<ScreenResized> {
    let (tx, rx) = screen_channel();
    world.add_system(PhysicsSystem::with_bounds(config.physics.clone()));
    world.add_system(CollisionSystem::new(events.clone()));
    world.add_system(PlayerSystem::new());
    world.add_system(ScreenConfigSystem::new(tx, config.screen_size()));
    world.add_system(RenderSystem::new());
    world.add_system(TextSystem::new());
    rx
}

pub struct Game {
    world: World,
    config: EngineConfig,
    time: WorldTime,
    input: InputState,
    screen_size: ScreenSize,
    screen_rx: Receiver<ScreenResized>,
    screen_entity: EntityId,
    events: EventBus,
    frames_since_cleanup: u32,
    #[cfg(feature = "lua")]
    script: Option<LuaRuntime>,
}

impl Game {
    /// Build a game with the default systems and a screen-config entity.
    pub fn new(config: EngineConfig, bindings: InputBindings) -> EcsResult<Self> {
        let mut world = World::new().with_debug(config.debug);
        let events = EventBus::new();
        let screen_rx = register_default_systems(&mut world, &config, &events.sender());
        let (w, h) = config.screen_size();
        let screen_entity = spawn_screen_config(&mut world, ScreenConfig::new(w, h))?;
        info!("Game created: {}x{}, dt={}", w, h, config.fixed_dt);

        Ok(Self {
            world,
            time: WorldTime::default(),
            input: InputState::new(bindings),
            screen_size: ScreenSize::new(w, h),
            screen_rx,
            screen_entity,
            events,
            frames_since_cleanup: 0,
            config,
            #[cfg(feature = "lua")]
            script: None,
        })
    }

    /// Build from a configuration, loading key bindings from its JSON file if set.
    pub fn from_config(config: EngineConfig) -> Result<Self, GameError> {
        let bindings = match &config.bindings_path {
            Some(path) => InputBindings::load_from_file(path)?,
            None => InputBindings::default(),
        };
        Ok(Game::new(config, bindings)?)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn time(&self) -> &WorldTime {
        &self.time
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn screen_size(&self) -> ScreenSize {
        self.screen_size
    }

    pub fn screen_entity(&self) -> EntityId {
        self.screen_entity
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Subscribe handlers or publish directly on the game's bus.
    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    /// Attach a script and give it the game's event sender.
    #[cfg(feature = "lua")]
    pub fn attach_script(&mut self, runtime: LuaRuntime) {
        runtime.set_event_sender(self.events.sender());
        self.script = Some(runtime);
    }

    #[cfg(feature = "lua")]
    pub fn script(&self) -> Option<&LuaRuntime> {
        self.script.as_ref()
    }

    /// Run one fixed-step frame.
    pub fn tick(&mut self, surface: Option<&mut dyn FrameSurface>) -> Result<(), GameError> {
        let dt = self.time.advance(self.config.fixed_dt);

        let mut io = FrameIo::new().with_input(&self.input);
        if let Some(surface) = surface {
            surface.clear(Color::BLACK);
            io = io.with_surface(surface);
        }
        self.world.frame(dt, io)?;

        #[cfg(feature = "lua")]
        self.run_script_update(dt)?;

        let delivered = self.events.dispatch(dt)?;
        if delivered > 0 {
            trace!("frame {}: dispatched {} events", self.time.frame, delivered);
        }

        for event in self.screen_rx.try_iter() {
            debug!(
                "screen resized {}x{} -> {}x{}",
                event.previous_width, event.previous_height, event.width, event.height
            );
            self.screen_size = ScreenSize::new(event.width, event.height);
            self.config.set_screen_size(event.width, event.height);
        }

        self.frames_since_cleanup += 1;
        if self.config.cleanup_interval > 0 && self.frames_since_cleanup >= self.config.cleanup_interval {
            self.frames_since_cleanup = 0;
            let removed = self.world.cleanup_inactive_entities();
            if removed > 0 {
                debug!("frame {}: cleaned up {} inactive entities", self.time.frame, removed);
            }
        }
        Ok(())
    }

    #[cfg(feature = "lua")]
    fn run_script_update(&mut self, dt: f32) -> Result<(), GameError> {
        let Some(script) = &self.script else {
            return Ok(());
        };
        let result = script.call_update(dt);
        self.world.apply_deferred();
        if let Err(err) = &result {
            log::error!(target: "lua", "update failed: {}", err);
        }
        result?;
        Ok(())
    }

    /// Run `frames` ticks, stopping at the first failing frame.
    pub fn run(&mut self, frames: u64, mut surface: Option<&mut dyn FrameSurface>) -> Result<(), GameError> {
        for _ in 0..frames {
            let frame_surface: Option<&mut dyn FrameSurface> = match surface.as_mut() {
                Some(s) => Some(&mut **s),
                None => None,
            };
            self.tick(frame_surface)?;
        }
        Ok(())
    }
}
