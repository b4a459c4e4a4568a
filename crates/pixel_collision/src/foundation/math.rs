//! Math utilities and types
//!
//! Provides the 2D vector and rectangle types shared by the collision code.
//! World space is y-down: positive `y` velocity means moving downward.

use serde::{Deserialize, Serialize};

pub use nalgebra::Vector2;

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// Axis-aligned rectangle in world space
///
/// `x`/`y` is the top-left corner. Rectangles are half-open: a rectangle
/// covers `[x, x + width) × [y, y + height)`, so two rectangles sharing an
/// edge do not overlap.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Horizontal extent
    pub width: f32,
    /// Vertical extent
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle from its top-left corner and size
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Right edge (exclusive)
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge (exclusive)
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Top-left corner as a vector
    pub fn origin(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Center point
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// True when the rectangle covers no area
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Check if the two rectangles share a region of positive area
    pub fn overlaps(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Check if the two rectangles overlap or share an edge
    pub fn touches(&self, other: &Rect) -> bool {
        self.x <= other.right()
            && other.x <= self.right()
            && self.y <= other.bottom()
            && other.y <= self.bottom()
    }

    /// Check if `other` lies entirely inside this rectangle
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Overlapping region of the two rectangles, `None` when they don't overlap
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.overlaps(other) {
            return None;
        }
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Some(Rect::new(x, y, right - x, bottom - y))
    }

    /// Same rectangle moved by `delta`
    pub fn translated(&self, delta: Vec2) -> Rect {
        Rect::new(self.x + delta.x, self.y + delta.y, self.width, self.height)
    }

    /// Split into four equal quadrants: NW, NE, SW, SE
    pub fn quadrants(&self) -> [Rect; 4] {
        let half_w = self.width * 0.5;
        let half_h = self.height * 0.5;
        [
            Rect::new(self.x, self.y, half_w, half_h),
            Rect::new(self.x + half_w, self.y, self.width - half_w, half_h),
            Rect::new(self.x, self.y + half_h, half_w, self.height - half_h),
            Rect::new(self.x + half_w, self.y + half_h, self.width - half_w, self.height - half_h),
        ]
    }
}

/// Axis-aligned rectangle in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelRect {
    /// Left column
    pub x: i32,
    /// Top row
    pub y: i32,
    /// Number of columns
    pub width: i32,
    /// Number of rows
    pub height: i32,
}

impl PixelRect {
    /// Create a new pixel rectangle
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// One past the last column, clamped to `i32::MAX`
    pub const fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// One past the last row, clamped to `i32::MAX`
    pub const fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// True when the rectangle covers no pixel
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Pixels covered by both rectangles, `None` if there are none
    pub fn intersection(&self, other: &PixelRect) -> Option<PixelRect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        let clipped = PixelRect::new(x, y, right.saturating_sub(x), bottom.saturating_sub(y));
        (!clipped.is_empty()).then_some(clipped)
    }

    /// The four corner pixels (top-left, top-right, bottom-left, bottom-right)
    pub const fn corners(&self) -> [(i32, i32); 4] {
        let last_x = self.right().saturating_sub(1);
        let last_y = self.bottom().saturating_sub(1);
        [(self.x, self.y), (last_x, self.y), (self.x, last_y), (last_x, last_y)]
    }
}

impl From<PixelRect> for Rect {
    fn from(rect: PixelRect) -> Self {
        Rect::new(rect.x as f32, rect.y as f32, rect.width as f32, rect.height as f32)
    }
}
