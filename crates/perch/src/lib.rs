#![forbid(unsafe_code)]

//! perch public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users.

pub use perch_core as core;
pub use perch_runtime as runtime;
pub use perch_widgets as widgets;

pub mod prelude {
    pub use perch_core as core;
    pub use perch_runtime as runtime;
    pub use perch_widgets as widgets;

    pub use perch_core::{FitQuery, Rect, Side, SidePriority, first_fit, fits};
    pub use perch_runtime::{
        BoxElement, Element, ElementRef, IntersectionEntry, ObserverConfig, ObserverRegistry,
        SimulatedBackend, Subscription, UnsupportedBackend, VisibilityBackend, VisibilityObserver,
    };
    pub use perch_widgets::{Popup, PopupConfig};
}
