//! Fundamental geometric and display types.

use serde::{Deserialize, Serialize};

/// 2D position/direction in screen space (pixels, y grows downward).
///
/// `glam::DVec2` already provides the value semantics the entities need:
/// component-wise add/subtract and scalar scale via operators.
pub type Vec2 = glam::DVec2;

/// Axis-aligned bounding box, position at the top-left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Aabb {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Box of size (w, h) anchored at `pos`.
    pub fn at(pos: Vec2, w: f64, h: f64) -> Self {
        Self::new(pos.x, pos.y, w, h)
    }

    /// Strict half-open overlap test: touching edges do not collide.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.x < other.x + other.w
            && self.x + self.w > other.x
            && self.y < other.y + other.h
            && self.y + self.h > other.y
    }
}

/// 8-bit RGBA color carried by every entity for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(220, 40, 40);
    pub const GREEN: Color = Color::rgb(40, 220, 80);
    pub const YELLOW: Color = Color::rgb(240, 220, 60);
    pub const PURPLE: Color = Color::rgb(170, 60, 220);
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}
