//! Property-based invariant tests for the side-fit evaluator.
//!
//! 1. `fits` is deterministic.
//! 2. Each side matches its closed-form main-axis and cross-axis checks.
//! 3. Growing the offset never turns a failing side into a fitting one.
//! 4. Growing the viewport outward never turns a fitting side into a failing one.
//! 5. `first_fit` returns the earliest fitting side of the priority.

use perch_core::{FitQuery, Rect, Side, SidePriority, first_fit, fits};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn rect_strategy() -> impl Strategy<Value = Rect> {
    // Integer-valued so edge sums are exact in f64.
    (-500i32..1500, -500i32..1500, 0i32..800, 0i32..800)
        .prop_map(|(x, y, w, h)| Rect::new(f64::from(x), f64::from(y), f64::from(w), f64::from(h)))
}

fn side_strategy() -> impl Strategy<Value = Side> {
    prop_oneof![
        Just(Side::Top),
        Just(Side::Bottom),
        Just(Side::Left),
        Just(Side::Right),
    ]
}

fn priority_strategy() -> impl Strategy<Value = SidePriority> {
    Just(Side::ALL.to_vec())
        .prop_shuffle()
        .prop_flat_map(|sides| (Just(sides), 1usize..=4))
        .prop_map(|(sides, n)| SidePriority::new(&sides[..n]).expect("distinct sides"))
}

fn reference(side: Side, c: Rect, content: Rect, vp: Rect, offset: f64) -> bool {
    let half = content.width / 2.0;
    let mid_x = c.x + c.width / 2.0;
    let mid_y = c.y + c.height / 2.0;
    let ix = mid_x - half >= vp.x && mid_x + half <= vp.x + vp.width;
    let iy = mid_y - half >= vp.y && mid_y + half <= vp.y + vp.height;
    match side {
        Side::Bottom => c.y + c.height + offset + content.height <= vp.y + vp.height && ix,
        Side::Top => c.y - offset - content.height >= vp.y && ix,
        Side::Right => c.x + c.width + offset + content.width <= vp.x + vp.width && iy,
        Side::Left => c.x - offset - content.width >= vp.x && iy,
    }
}

proptest! {
    #[test]
    fn fits_is_deterministic(
        side in side_strategy(),
        c in rect_strategy(),
        content in rect_strategy(),
        vp in rect_strategy(),
        offset in (0u8..64).prop_map(f64::from),
    ) {
        prop_assert_eq!(
            fits(side, c, content, vp, offset),
            fits(side, c, content, vp, offset)
        );
    }

    #[test]
    fn fits_matches_closed_form(
        side in side_strategy(),
        c in rect_strategy(),
        content in rect_strategy(),
        vp in rect_strategy(),
        offset in (0u8..64).prop_map(f64::from),
    ) {
        prop_assert_eq!(
            fits(side, c, content, vp, offset),
            reference(side, c, content, vp, offset),
            "side={} container={:?} content={:?} viewport={:?} offset={}",
            side, c, content, vp, offset
        );
    }

    #[test]
    fn larger_offset_never_helps(
        side in side_strategy(),
        c in rect_strategy(),
        content in rect_strategy(),
        vp in rect_strategy(),
        offset in (0u8..64).prop_map(f64::from),
        extra in (0u8..64).prop_map(f64::from),
    ) {
        if fits(side, c, content, vp, offset + extra) {
            prop_assert!(fits(side, c, content, vp, offset));
        }
    }

    #[test]
    fn larger_viewport_never_hurts(
        side in side_strategy(),
        c in rect_strategy(),
        content in rect_strategy(),
        vp in rect_strategy(),
        grow in (0u8..200).prop_map(f64::from),
    ) {
        let bigger = Rect::new(vp.x - grow, vp.y - grow, vp.width + 2.0 * grow, vp.height + 2.0 * grow);
        if fits(side, c, content, vp, 0.0) {
            prop_assert!(fits(side, c, content, bigger, 0.0));
        }
    }

    #[test]
    fn first_fit_is_earliest_fitting(
        priority in priority_strategy(),
        c in rect_strategy(),
        content in rect_strategy(),
        vp in rect_strategy(),
        offset in (0u8..32).prop_map(f64::from),
    ) {
        let q = FitQuery::new(c, content, vp).offset(offset);
        let expected = priority.iter().find(|&s| fits(s, c, content, vp, offset));
        prop_assert_eq!(first_fit(&priority, &q), expected);
    }
}

// ── Fixed scenarios ─────────────────────────────────────────────────────

#[test]
fn bottom_fit_threshold_scenario() {
    let container = Rect::from_edges(100.0, 60.0, 140.0, 100.0);
    let content = Rect::new(0.0, 0.0, 40.0, 50.0);
    let tall = Rect::from_edges(0.0, 0.0, 400.0, 200.0);
    let short = Rect::from_edges(0.0, 0.0, 400.0, 150.0);
    assert!(fits(Side::Bottom, container, content, tall, 10.0));
    assert!(!fits(Side::Bottom, container, content, short, 10.0));
}
