//! Screen resolution change notifications.
//!
//! The [`ScreenConfigSystem`](crate::systems::screenconfig::ScreenConfigSystem)
//! sends a [`ScreenResized`] over a `crossbeam_channel` whenever a
//! [`ScreenConfig`](crate::components::screenconfig::ScreenConfig) asks for a
//! size different from the one last applied. The host drains the receiver
//! after each frame and resizes its window or framebuffer.

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::ecs::entity::EntityId;

/// A requested resolution change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenResized {
    /// Entity whose `ScreenConfig` requested the change.
    pub source: EntityId,
    pub width: u32,
    pub height: u32,
    pub previous_width: u32,
    pub previous_height: u32,
}

/// Create the channel pair connecting the screen system to the host.
pub fn screen_channel() -> (Sender<ScreenResized>, Receiver<ScreenResized>) {
    unbounded::<ScreenResized>()
}
