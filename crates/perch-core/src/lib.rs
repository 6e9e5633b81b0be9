#![forbid(unsafe_code)]

//! Core: geometry, anchor sides, and the side-fit evaluator.
//!
//! # Role in perch
//! `perch-core` is the pure layer. It owns the [`Rect`] snapshot type, the
//! closed [`Side`] enumeration with its validated [`SidePriority`], and the
//! intersection evaluator that decides whether a side keeps floating content
//! on screen.
//!
//! # How it fits in the system
//! The runtime (`perch-runtime`) delivers visibility notifications carrying
//! content and viewport bounds; the placement controller (`perch-widgets`)
//! feeds those bounds through [`intersects::fits`] in priority order and
//! commits the first side that passes. Nothing here holds state.

pub mod geometry;
pub mod intersects;
pub mod side;

pub use geometry::{Insets, Rect};
pub use intersects::{FitQuery, first_fit, fits};
pub use side::{Side, SidePriority, SidePriorityError};
