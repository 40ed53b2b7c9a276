//! Collision shape component.
//!
//! A [`Collider`] attaches a [`Shape`] to an entity's
//! [`Transform`](super::transform::Transform). The shape is placed at the
//! transform position plus `offset`: a box by its top-left corner, a circle by
//! its center. Scale and rotation are not applied.
//!
//! Two colliders are tested against each other only when the layer of one is
//! in the mask of the other. Every test starts with an axis-aligned bounds
//! check before the exact shape-pair test. Touching edges count as contact.

use serde::{Deserialize, Serialize};

/// Default collision layer.
pub const DEFAULT_LAYER: u32 = 1;
/// Mask that accepts every layer.
pub const ALL_LAYERS: u32 = u32::MAX;

/// Local collision shape.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Box { width: f32, height: f32 },
    Circle { radius: f32 },
}

impl Default for Shape {
    fn default() -> Self {
        Shape::Box {
            width: 0.0,
            height: 0.0,
        }
    }
}

/// Axis-aligned bounding box in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn overlaps(&self, other: &Bounds) -> bool {
        !(self.max_x < other.min_x
            || self.min_x > other.max_x
            || self.max_y < other.min_y
            || self.min_y > other.max_y)
    }

    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

/// A shape placed in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WorldShape {
    /// Box with its corners already normalized.
    Box(Bounds),
    Circle { x: f32, y: f32, radius: f32 },
}

impl WorldShape {
    /// Place a box by its top-left corner. Negative sizes extend left or up.
    pub fn boxed(x: f32, y: f32, width: f32, height: f32) -> Self {
        let (x1, y1) = (x + width, y + height);
        WorldShape::Box(Bounds {
            min_x: x.min(x1),
            min_y: y.min(y1),
            max_x: x.max(x1),
            max_y: y.max(y1),
        })
    }

    pub fn circle(x: f32, y: f32, radius: f32) -> Self {
        WorldShape::Circle {
            x,
            y,
            radius: radius.abs(),
        }
    }

    pub fn bounds(&self) -> Bounds {
        match *self {
            WorldShape::Box(bounds) => bounds,
            WorldShape::Circle { x, y, radius } => Bounds {
                min_x: x - radius,
                min_y: y - radius,
                max_x: x + radius,
                max_y: y + radius,
            },
        }
    }

    pub fn center(&self) -> (f32, f32) {
        match *self {
            WorldShape::Box(b) => ((b.min_x + b.max_x) / 2.0, (b.min_y + b.max_y) / 2.0),
            WorldShape::Circle { x, y, .. } => (x, y),
        }
    }

    pub fn intersects(&self, other: &WorldShape) -> bool {
        if !self.bounds().overlaps(&other.bounds()) {
            return false;
        }
        match (*self, *other) {
            // Bounds of two boxes are the boxes themselves.
            (WorldShape::Box(_), WorldShape::Box(_)) => true,
            (WorldShape::Box(b), WorldShape::Circle { x, y, radius })
            | (WorldShape::Circle { x, y, radius }, WorldShape::Box(b)) => {
                box_circle(&b, x, y, radius)
            }
            (
                WorldShape::Circle { x: ax, y: ay, radius: ar },
                WorldShape::Circle { x: bx, y: by, radius: br },
            ) => {
                let (dx, dy) = (ax - bx, ay - by);
                dx * dx + dy * dy <= (ar + br) * (ar + br)
            }
        }
    }
}

fn box_circle(b: &Bounds, x: f32, y: f32, radius: f32) -> bool {
    let closest_x = x.clamp(b.min_x, b.max_x);
    let closest_y = y.clamp(b.min_y, b.max_y);
    let (dx, dy) = (x - closest_x, y - closest_y);
    dx * dx + dy * dy <= radius * radius
}

/// Collision shape with layer filtering.
///
/// # Fields
/// - `shape` - local shape, see [`Shape`]
/// - `offset_x`, `offset_y` - displacement from the transform position
/// - `layer` - bit set of layers this collider belongs to
/// - `mask` - bit set of layers this collider reacts to
///
/// # Example
/// ```ignore
/// let hull = Collider::boxed(32.0, 16.0).with_offset(-16.0, -8.0).with_layers(0b01, 0b10);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Collider {
    pub shape: Shape,
    pub offset_x: f32,
    pub offset_y: f32,
    pub layer: u32,
    pub mask: u32,
}

impl Default for Collider {
    fn default() -> Self {
        Self {
            shape: Shape::default(),
            offset_x: 0.0,
            offset_y: 0.0,
            layer: DEFAULT_LAYER,
            mask: ALL_LAYERS,
        }
    }
}

impl Collider {
    pub fn boxed(width: f32, height: f32) -> Self {
        Self {
            shape: Shape::Box { width, height },
            ..Self::default()
        }
    }

    pub fn circle(radius: f32) -> Self {
        Self {
            shape: Shape::Circle { radius },
            ..Self::default()
        }
    }

    pub fn with_offset(mut self, x: f32, y: f32) -> Self {
        self.offset_x = x;
        self.offset_y = y;
        self
    }

    pub fn with_layers(mut self, layer: u32, mask: u32) -> Self {
        self.layer = layer;
        self.mask = mask;
        self
    }

    /// `true` if either collider's mask accepts the other's layer.
    pub fn interacts_with(&self, other: &Collider) -> bool {
        self.layer & other.mask != 0 || other.layer & self.mask != 0
    }

    /// The shape placed at an entity position.
    pub fn world_shape(&self, x: f32, y: f32) -> WorldShape {
        let (x, y) = (x + self.offset_x, y + self.offset_y);
        match self.shape {
            Shape::Box { width, height } => WorldShape::boxed(x, y, width, height),
            Shape::Circle { radius } => WorldShape::circle(x, y, radius),
        }
    }
}
