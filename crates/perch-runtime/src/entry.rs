#![forbid(unsafe_code)]

//! Visibility notification records.

use perch_core::Rect;

use crate::element::ElementRef;

/// One visibility-change report for one observed element.
///
/// Placement reads only [`Self::bounding_client_rect`] (the content box) and
/// [`Self::root_bounds`] (the viewport box).
#[derive(Debug, Clone)]
pub struct IntersectionEntry {
    /// The observed element.
    pub target: ElementRef,
    /// The target's box at report time.
    pub bounding_client_rect: Rect,
    /// The visible part of the target inside the root.
    pub intersection_rect: Rect,
    /// The root's box grown by the root margin. `None` when the host cannot
    /// expose it.
    pub root_bounds: Option<Rect>,
    /// Visible fraction of the target, in `[0, 1]`.
    pub intersection_ratio: f64,
    pub is_intersecting: bool,
    /// Milliseconds since the backend's time origin.
    pub time: f64,
}

impl IntersectionEntry {
    /// A "fully visible" report built from the target's own box.
    ///
    /// Used when the host has no visibility tracking: the target's bounds
    /// stand in for both the intersection and the root, so every placement
    /// check sees the content exactly filling the viewport.
    #[must_use]
    pub fn synthesized(target: &ElementRef, threshold: Option<f64>) -> Self {
        let bounds = target.bounding_client_rect();
        Self {
            target: target.clone(),
            bounding_client_rect: bounds,
            intersection_rect: bounds,
            root_bounds: Some(bounds),
            intersection_ratio: threshold.unwrap_or(0.0),
            is_intersecting: true,
            time: 0.0,
        }
    }
}
