//! Screen size resource.
//!
//! Stores the resolution the host last applied, in pixels. The game host
//! updates it from [`ScreenResized`](crate::events::screen::ScreenResized)
//! events.

/// Current screen size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScreenSize {
    /// Width in pixels.
    pub w: u32,
    /// Height in pixels.
    pub h: u32,
}

impl ScreenSize {
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.h == 0 {
            return 0.0;
        }
        self.w as f32 / self.h as f32
    }
}
