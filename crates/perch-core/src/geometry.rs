#![forbid(unsafe_code)]

//! Geometric primitives in viewport coordinates.

use serde::{Deserialize, Serialize};

/// An axis-aligned box in viewport coordinates (CSS pixels, origin at the
/// top-left of the viewport, y grows downward).
///
/// A `Rect` is a snapshot: it is taken once per evaluation and never updated
/// in place by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

/// Per-edge insets, used to grow or shrink a [`Rect`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Insets {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Insets {
    /// Same inset on all four edges.
    #[must_use]
    pub const fn all(value: f64) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }
}

impl Rect {
    /// Create a rectangle from its origin and size.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from its four edges.
    ///
    /// A `right < left` (or `bottom < top`) pair collapses to zero extent.
    #[inline]
    #[must_use]
    pub fn from_edges(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self::new(left, top, (right - left).max(0.0), (bottom - top).max(0.0))
    }

    /// Left edge. Alias for `self.x`.
    #[inline]
    #[must_use]
    pub const fn left(&self) -> f64 {
        self.x
    }

    /// Top edge. Alias for `self.y`.
    #[inline]
    #[must_use]
    pub const fn top(&self) -> f64 {
        self.y
    }

    #[inline]
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Horizontal midpoint.
    #[inline]
    #[must_use]
    pub fn mid_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    /// Vertical midpoint.
    #[inline]
    #[must_use]
    pub fn mid_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    #[inline]
    #[must_use]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Check if the rectangle has zero area.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Compute the overlap with another rectangle.
    ///
    /// Returns `None` when the rectangles do not touch. Rectangles sharing
    /// only an edge produce a zero-area overlap, matching how hosts report
    /// an element sitting exactly on the root boundary.
    #[must_use]
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.left().max(other.left());
        let top = self.top().max(other.top());
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right >= left && bottom >= top {
            Some(Rect::from_edges(left, top, right, bottom))
        } else {
            None
        }
    }

    /// Grow the rectangle outward by `insets` (negative values shrink it).
    #[must_use]
    pub fn inflate(&self, insets: Insets) -> Rect {
        Rect::from_edges(
            self.left() - insets.left,
            self.top() - insets.top,
            self.right() + insets.right,
            self.bottom() + insets.bottom,
        )
    }
}
