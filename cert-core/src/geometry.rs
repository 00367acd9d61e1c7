//! Geometry helpers in document coordinate space.
//!
//! Document coordinates are fixed logical pixels, independent of the
//! on-screen viewport. The viewport only contributes the canvas origin used
//! to translate pointer positions.

use serde::{Deserialize, Serialize};

/// Default canvas width in document pixels.
pub const DEFAULT_CANVAS_WIDTH: f32 = 800.0;

/// Default canvas height in document pixels.
pub const DEFAULT_CANVAS_HEIGHT: f32 = 600.0;

/// A point (or offset) in 2D space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl Point {
    /// Origin point.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Component-wise subtraction.
    #[must_use]
    pub fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

/// Fixed logical size of the certificate canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    /// Width in document pixels.
    pub width: f32,
    /// Height in document pixels.
    pub height: f32,
}

impl CanvasSize {
    /// Create a canvas size.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Center of the canvas, where new elements are placed.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Clamp a position to `[0, width] x [0, height]`.
    #[must_use]
    pub fn clamp_point(&self, p: Point) -> Point {
        Point::new(clamp_axis(p.x, self.width), clamp_axis(p.y, self.height))
    }

    /// Whether the canvas is wider than tall.
    #[must_use]
    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::new(DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT)
    }
}

/// Axis-aligned rectangle in document coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Top-left corner.
    #[must_use]
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Whether `p` lies inside the rectangle (edges inclusive).
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }
}

/// Clamp a single coordinate to `[0, max]`.
///
/// NaN collapses to `0` so a bad pointer sample can never leave the canvas.
#[must_use]
pub fn clamp_axis(value: f32, max: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, max.max(0.0))
}

/// Element position for a drag: pointer minus canvas origin minus grab offset,
/// clamped to the canvas.
#[must_use]
pub fn drag_position(pointer: Point, canvas_origin: Point, grab_offset: Point, canvas: CanvasSize) -> Point {
    canvas.clamp_point(pointer.sub(canvas_origin).sub(grab_offset))
}

/// Left edge of a box whose stored `x` is its anchor.
///
/// Center-aligned elements store their horizontal center; everything else
/// stores the left edge.
#[must_use]
pub fn anchored_left(x: f32, width: f32, centered: bool) -> f32 {
    if centered {
        x - width / 2.0
    } else {
        x
    }
}

/// Clamp a size attribute to at least `min`, rejecting non-finite input.
#[must_use]
pub fn clamp_min(value: f32, min: f32) -> Option<f32> {
    value.is_finite().then(|| value.max(min))
}
