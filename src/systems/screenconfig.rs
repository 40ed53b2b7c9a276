//! Screen configuration watcher.
//!
//! Compares every matched [`ScreenConfig`] with the resolution last applied
//! and, on a difference, sends a [`ScreenResized`] to the host and records
//! the new size. The host owns the window; this system never blocks on it.

use crossbeam_channel::Sender;
use log::{info, warn};

use crate::components::screenconfig::ScreenConfig;
use crate::ecs::component::{ComponentKind, ComponentSet};
use crate::ecs::error::SystemResult;
use crate::ecs::system::{System, SystemBase, SystemContext, SystemPriority};
use crate::events::screen::ScreenResized;

pub struct ScreenConfigSystem {
    base: SystemBase,
    tx: Sender<ScreenResized>,
    current_width: u32,
    current_height: u32,
}

impl ScreenConfigSystem {
    pub const NAME: &'static str = "screen_config";

    /// `initial` is the size the host window already has.
    pub fn new(tx: Sender<ScreenResized>, initial: (u32, u32)) -> Self {
        Self {
            base: SystemBase::new(
                Self::NAME,
                SystemPriority::UPDATE,
                ComponentSet::of(&[ComponentKind::ScreenConfig]),
            ),
            tx,
            current_width: initial.0,
            current_height: initial.1,
        }
    }

    pub fn current_size(&self) -> (u32, u32) {
        (self.current_width, self.current_height)
    }
}

impl System for ScreenConfigSystem {
    fn base(&self) -> &SystemBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut SystemBase {
        &mut self.base
    }

    fn update(&mut self, _dt: f32, ctx: &mut SystemContext<'_, '_>) -> SystemResult {
        for id in self.base.matched().iter() {
            let config = *ctx.component::<ScreenConfig>(id);
            if (config.width, config.height) == (self.current_width, self.current_height) {
                continue;
            }

            info!("Screen config changed: {}x{}", config.width, config.height);
            let event = ScreenResized {
                source: id,
                width: config.width,
                height: config.height,
                previous_width: self.current_width,
                previous_height: self.current_height,
            };
            // A dropped receiver means the host is shutting down.
            if self.tx.send(event).is_err() {
                warn!("screen resize receiver disconnected");
            }
            self.current_width = config.width;
            self.current_height = config.height;
        }
        Ok(())
    }
}
