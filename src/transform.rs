//! World/screen coordinate conversion.
//!
//! Node and edge positions live in **world space**. Pointer events and laid-out
//! port frames arrive in **screen space**. The two are related by a pan offset
//! (screen units) and a zoom scale:
//!
//! ```text
//! screen = world * scale + offset
//! world  = (screen - offset) / scale
//! ```
//!
//! Sizes scale by `scale` only; they are never translated.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// A 2D point (or vector) in either world or screen space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_sq(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance(self, other: Point) -> f32 {
        self.distance_sq(other).sqrt()
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Linear interpolation towards `other`.
    pub fn lerp(self, other: Point, t: f32) -> Point {
        Point::new(self.x + (other.x - self.x) * t, self.y + (other.y - self.y) * t)
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Point {
    type Output = Point;
    fn mul(self, rhs: f32) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle: top-left origin plus size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    pub fn min_x(&self) -> f32 {
        self.origin.x
    }

    pub fn min_y(&self) -> f32 {
        self.origin.y
    }

    pub fn max_x(&self) -> f32 {
        self.origin.x + self.size.width
    }

    pub fn max_y(&self) -> f32 {
        self.origin.y + self.size.height
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.origin.x + self.size.width * 0.5,
            self.origin.y + self.size.height * 0.5,
        )
    }

    /// Inclusive containment test (points on the border count as inside).
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x() && p.x <= self.max_x() && p.y >= self.min_y() && p.y <= self.max_y()
    }

    /// Smallest rectangle enclosing both.
    pub fn union(&self, other: &Rect) -> Rect {
        let min_x = self.min_x().min(other.min_x());
        let min_y = self.min_y().min(other.min_y());
        let max_x = self.max_x().max(other.max_x());
        let max_y = self.max_y().max(other.max_y());
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

/// Convert a world-space point to screen space.
pub fn world_to_screen(point: Point, offset: Point, scale: f32) -> Point {
    point * scale + offset
}

/// Convert a screen-space point to world space.
pub fn screen_to_world(point: Point, offset: Point, scale: f32) -> Point {
    let s = if scale > 0.0 { scale } else { 1.0 };
    Point::new((point.x - offset.x) / s, (point.y - offset.y) / s)
}

pub fn size_to_screen(size: Size, scale: f32) -> Size {
    Size::new(size.width * scale, size.height * scale)
}

pub fn size_to_world(size: Size, scale: f32) -> Size {
    let s = if scale > 0.0 { scale } else { 1.0 };
    Size::new(size.width / s, size.height / s)
}

/// The world-space rectangle currently visible in a canvas of `canvas_size`
/// screen units. The grid renderer uses it to bound dot iteration.
pub fn visible_world_rect(canvas_size: Size, offset: Point, scale: f32) -> Rect {
    let origin = screen_to_world(Point::ZERO, offset, scale);
    Rect::from_origin_size(origin, size_to_world(canvas_size, scale))
}

/// Pan offset plus zoom scale, bundled for passing around.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub offset: Point,
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        offset: Point::ZERO,
        scale: 1.0,
    };

    pub fn new(offset: Point, scale: f32) -> Self {
        Self { offset, scale }
    }

    pub fn world_to_screen(&self, p: Point) -> Point {
        world_to_screen(p, self.offset, self.scale)
    }

    pub fn screen_to_world(&self, p: Point) -> Point {
        screen_to_world(p, self.offset, self.scale)
    }

    pub fn rect_to_screen(&self, r: Rect) -> Rect {
        Rect::from_origin_size(self.world_to_screen(r.origin), size_to_screen(r.size, self.scale))
    }

    pub fn rect_to_world(&self, r: Rect) -> Rect {
        Rect::from_origin_size(self.screen_to_world(r.origin), size_to_world(r.size, self.scale))
    }

    pub fn visible_world_rect(&self, canvas_size: Size) -> Rect {
        visible_world_rect(canvas_size, self.offset, self.scale)
    }

    /// Map a screen point as laid out under `self` to where the same world
    /// point lands under `to`.
    pub fn reproject(&self, screen: Point, to: &Transform) -> Point {
        to.world_to_screen(self.screen_to_world(screen))
    }
}
