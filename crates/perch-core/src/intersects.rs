#![forbid(unsafe_code)]

//! Side-fit evaluation for anchored floating content.
//!
//! Given the container's box, the content's natural box and the visible
//! viewport, [`fits`] decides whether placing the content on a side keeps it
//! fully inside the viewport.
//!
//! # Decision rule
//!
//! The main-axis check reserves `offset` pixels between container and
//! content. The cross-axis check centres the content on the container's
//! midpoint:
//!
//! - `top` / `bottom` require the content's width, centred on the
//!   container's horizontal midpoint, to stay within the viewport.
//! - `left` / `right` require the same centred span on the vertical
//!   midpoint. That span uses the content's *width* as its half-extent, not
//!   its height, so tall narrow panels are judged by their width.
//!
//! The evaluator is pure: the same inputs always give the same answer.

use crate::geometry::Rect;
use crate::side::{Side, SidePriority};

/// Inputs for one fit evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitQuery {
    /// The anchor's current box.
    pub container: Rect,
    /// The floating panel's box. Only its width and height are read.
    pub content: Rect,
    /// The visible box of the scroll container or window.
    pub viewport: Rect,
    /// Gap reserved between anchor and panel (default 0).
    pub offset: f64,
}

impl FitQuery {
    #[must_use]
    pub const fn new(container: Rect, content: Rect, viewport: Rect) -> Self {
        Self {
            container,
            content,
            viewport,
            offset: 0.0,
        }
    }

    /// Set the gap between container and content.
    #[must_use]
    pub const fn offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    fn intersects_x(&self) -> bool {
        let mid = self.container.mid_x();
        let half = self.content.width / 2.0;
        mid - half >= self.viewport.left() && mid + half <= self.viewport.right()
    }

    fn intersects_y(&self) -> bool {
        let mid = self.container.mid_y();
        let half = self.content.width / 2.0;
        mid - half >= self.viewport.top() && mid + half <= self.viewport.bottom()
    }

    /// Whether `side` keeps the content inside the viewport.
    #[must_use]
    pub fn fits(&self, side: Side) -> bool {
        let Self {
            container,
            content,
            viewport,
            offset,
        } = self;
        match side {
            Side::Bottom => {
                container.bottom() + offset + content.height <= viewport.bottom()
                    && self.intersects_x()
            }
            Side::Top => {
                container.top() - offset - content.height >= viewport.top() && self.intersects_x()
            }
            Side::Right => {
                container.right() + offset + content.width <= viewport.right()
                    && self.intersects_y()
            }
            Side::Left => {
                container.left() - offset - content.width >= viewport.left() && self.intersects_y()
            }
        }
    }

    /// First side in `priority` that fits, if any.
    #[must_use]
    pub fn first_fit(&self, priority: &SidePriority) -> Option<Side> {
        priority.iter().find(|&side| self.fits(side))
    }
}

/// Whether placing `content` on `side` of `container` keeps it inside
/// `viewport`, leaving `offset` pixels between the two.
#[must_use]
pub fn fits(side: Side, container: Rect, content: Rect, viewport: Rect, offset: f64) -> bool {
    FitQuery::new(container, content, viewport)
        .offset(offset)
        .fits(side)
}

/// First side in `priority` satisfying [`fits`]. `None` means nothing fits;
/// callers decide whether to keep their last placement.
#[must_use]
pub fn first_fit(priority: &SidePriority, query: &FitQuery) -> Option<Side> {
    query.first_fit(priority)
}
