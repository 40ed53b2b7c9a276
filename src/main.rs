//! Kestrel main entry point.
//!
//! Runs the engine headless for a fixed number of frames: the default
//! systems draw into a [`DrawList`] instead of a window, which makes the
//! binary useful for smoke-testing scripts and configuration files.
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --frames 600 --script ./scripts/demo.lua
//! ```

use std::cell::Cell;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use clap::Parser;
use log::{error, info, warn};

use kestrel::components::collider::Collider;
use kestrel::components::physics::Physics;
use kestrel::components::sprite::Sprite;
use kestrel::components::text::Text;
use kestrel::components::transform::Transform;
use kestrel::ecs::error::EcsResult;
use kestrel::ecs::world::World;
use kestrel::events::bus::EventPriority;
use kestrel::events::collision::COLLISION_EVENT;
use kestrel::game::Game;
use kestrel::resources::gameconfig::EngineConfig;
use kestrel::resources::surface::DrawList;
use kestrel::systems::player::PLAYER_TAG;

#[cfg(feature = "lua")]
use kestrel::scripting::lua_runtime::LuaRuntime;

const DEMO_BULLETS: usize = 16;

/// Kestrel 2D runtime
#[derive(Parser)]
#[command(version, about = "Headless runner for the Kestrel 2D runtime")]
struct Cli {
    /// INI configuration file.
    #[arg(long, value_name = "PATH", default_value = "./config.ini")]
    config: PathBuf,

    /// Log entity match/unmatch notifications at debug level.
    #[arg(long)]
    debug: bool,

    /// Number of fixed-step frames to run.
    #[arg(long, default_value_t = 300)]
    frames: u64,

    /// Lua script to load before the first frame.
    #[cfg(feature = "lua")]
    #[arg(long, value_name = "PATH")]
    script: Option<PathBuf>,

    /// Write a configuration file with default values and exit.
    #[arg(long)]
    write_default_config: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if cli.write_default_config {
        let config = EngineConfig::with_path(&cli.config);
        return match config.save_to_file() {
            Ok(()) => {
                println!("Default config written to {}", cli.config.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let mut config = EngineConfig::with_path(&cli.config);
    if let Err(e) = config.load_from_file() {
        warn!("Using default configuration: {}", e);
    }
    config.debug |= cli.debug;

    let mut game = match Game::from_config(config) {
        Ok(game) => game,
        Err(e) => {
            error!("Failed to start: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = spawn_demo(game.world_mut()) {
        error!("Failed to spawn demo entities: {}", e);
        return ExitCode::FAILURE;
    }

    #[cfg(feature = "lua")]
    if let Some(path) = &cli.script {
        match LuaRuntime::new(game.world().handle()) {
            Ok(runtime) => {
                if let Err(e) = runtime.run_script(path) {
                    error!("Failed to load {}: {}", path.display(), e);
                    return ExitCode::FAILURE;
                }
                game.world_mut().apply_deferred();
                game.attach_script(runtime);
            }
            Err(e) => {
                error!("Failed to create Lua runtime: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    let collisions = Rc::new(Cell::new(0u64));
    let counter = Rc::clone(&collisions);
    game.events_mut()
        .subscribe(COLLISION_EVENT, EventPriority::Low, move |_| {
            counter.set(counter.get() + 1);
            Ok(())
        });

    let mut surface = DrawList::new();
    for _ in 0..cli.frames {
        if let Err(e) = game.tick(Some(&mut surface)) {
            error!("Frame {} failed: {}", game.time().frame, e);
            return ExitCode::FAILURE;
        }
        surface.take();
    }

    let world = game.world();
    info!(
        "Ran {} frames ({:.2}s): {} entities, {} active, {} bullets left, {} collisions",
        game.time().frame,
        game.time().elapsed,
        world.total_entities(),
        world.active_entity_count(),
        world.find_entities_by_tag("bullet").len(),
        collisions.get()
    );
    ExitCode::SUCCESS
}

/// A player, a label and a volley of bullets flying upwards.
fn spawn_demo(world: &mut World) -> EcsResult<()> {
    let player = world.create_entity();
    world.add_tag(player, PLAYER_TAG)?;
    world.add_component(player, Transform::new(640.0, 600.0))?;
    world.add_component(player, Sprite::new("player_idle", 32.0, 48.0).with_layer(1))?;
    world.add_component(player, Collider::boxed(32.0, 48.0).with_offset(-16.0, -48.0))?;

    let label = world.create_entity();
    world.add_component(label, Text::new("kestrel", 8.0, 8.0))?;

    for _ in 0..DEMO_BULLETS {
        let bullet = world.create_entity();
        world.add_tag(bullet, "bullet")?;
        world.add_component(bullet, Transform::new(fastrand::f32() * 1280.0, 600.0))?;
        world.add_component(
            bullet,
            Physics::new().with_velocity(0.0, -(120.0 + fastrand::f32() * 240.0)),
        )?;
        world.add_component(bullet, Sprite::new("bullet", 4.0, 8.0))?;
        world.add_component(bullet, Collider::circle(3.0))?;
    }
    Ok(())
}
