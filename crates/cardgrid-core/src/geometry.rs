#![forbid(unsafe_code)]

//! Geometric primitives.
//!
//! Grid types use integer grid units (one column or row step). Pixel types use
//! `f64` host-surface pixels and only appear at the coordinate-transform
//! boundary.

use serde::{Deserialize, Serialize};

/// A cell coordinate in grid units (0-indexed, origin at top-left).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: u16,
    pub y: u16,
}

impl GridPosition {
    #[inline]
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// Manhattan distance between two cell coordinates.
    #[inline]
    pub const fn manhattan_distance(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) as u32 + self.y.abs_diff(other.y) as u32
    }
}

/// A span in grid units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    pub w: u16,
    pub h: u16,
}

impl GridSize {
    #[inline]
    pub const fn new(w: u16, h: u16) -> Self {
        Self { w, h }
    }
}

impl Default for GridSize {
    fn default() -> Self {
        Self { w: 1, h: 1 }
    }
}

/// An axis-aligned rectangle in grid units.
///
/// `x`/`y` are the top-left cell (inclusive); `w`/`h` are spans in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridRect {
    pub x: u16,
    pub y: u16,
    pub w: u16,
    pub h: u16,
}

impl GridRect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: u16, y: u16, w: u16, h: u16) -> Self {
        Self { x, y, w, h }
    }

    /// Create a rectangle from a position and a size.
    #[inline]
    pub const fn from_parts(position: GridPosition, size: GridSize) -> Self {
        Self::new(position.x, position.y, size.w, size.h)
    }

    /// Top-left cell.
    #[inline]
    pub const fn position(&self) -> GridPosition {
        GridPosition::new(self.x, self.y)
    }

    /// Span in cells.
    #[inline]
    pub const fn size(&self) -> GridSize {
        GridSize::new(self.w, self.h)
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> u16 {
        self.x.saturating_add(self.w)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> u16 {
        self.y.saturating_add(self.h)
    }

    /// Area in cells.
    #[inline]
    pub const fn area(&self) -> u32 {
        self.w as u32 * self.h as u32
    }

    /// Check if the rectangle has zero area.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Check if a cell is inside the rectangle.
    #[inline]
    pub const fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Axis-aligned overlap test.
    ///
    /// Edges that merely touch do not overlap. Empty rectangles never overlap
    /// anything.
    #[inline]
    pub const fn intersects(&self, other: &GridRect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Manhattan distance between the top-left corners of two rectangles.
    #[inline]
    pub const fn manhattan_distance(&self, other: &GridRect) -> u32 {
        self.position().manhattan_distance(other.position())
    }

    /// Same rectangle moved to `position`.
    #[inline]
    #[must_use]
    pub const fn with_position(self, position: GridPosition) -> Self {
        Self::new(position.x, position.y, self.w, self.h)
    }

    /// Same rectangle resized to `size`, keeping the top-left corner.
    #[inline]
    #[must_use]
    pub const fn with_size(self, size: GridSize) -> Self {
        Self::new(self.x, self.y, size.w, size.h)
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &GridRect) -> GridRect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        GridRect::new(x, y, right - x, bottom - y)
    }
}

/// A point on the host surface, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise `self - origin`.
    #[inline]
    pub fn delta_from(self, origin: PixelPoint) -> (f64, f64) {
        (self.x - origin.x, self.y - origin.y)
    }
}

/// A rectangle on the host surface, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    #[inline]
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Check if a point is inside the rectangle (edges inclusive).
    #[inline]
    pub fn contains(&self, point: PixelPoint) -> bool {
        point.x >= self.left
            && point.x <= self.right()
            && point.y >= self.top
            && point.y <= self.bottom()
    }

    /// Top-left corner.
    #[inline]
    pub const fn origin(&self) -> PixelPoint {
        PixelPoint::new(self.left, self.top)
    }
}

/// Per-edge pixel insets (margins around the grid surface).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Sides {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Sides {
    /// Create new sides with equal values.
    pub const fn all(val: f64) -> Self {
        Self {
            top: val,
            right: val,
            bottom: val,
            left: val,
        }
    }

    /// Create new sides with specific values.
    pub const fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Sum of left and right.
    #[inline]
    pub fn horizontal_sum(&self) -> f64 {
        self.left + self.right
    }

    /// Sum of top and bottom.
    #[inline]
    pub fn vertical_sum(&self) -> f64 {
        self.top + self.bottom
    }

    /// Whether every side is finite and non-negative.
    pub fn is_valid(&self) -> bool {
        [self.top, self.right, self.bottom, self.left]
            .iter()
            .all(|side| side.is_finite() && *side >= 0.0)
    }
}

impl From<f64> for Sides {
    fn from(val: f64) -> Self {
        Self::all(val)
    }
}

impl From<(f64, f64, f64, f64)> for Sides {
    fn from((top, right, bottom, left): (f64, f64, f64, f64)) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }
}
