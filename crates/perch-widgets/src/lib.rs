#![forbid(unsafe_code)]

//! Widgets: the auto-repositioning popup controller.
//!
//! [`Popup`] keeps a floating panel on whichever side of its trigger has
//! room, re-deciding on every visibility report delivered through a shared
//! [`perch_runtime::ObserverRegistry`]. [`PopupConfig`] carries the placement
//! options and can be read from `PERCH_POPUP_*` environment variables.

/// Popup placement controller and its configuration.
pub mod popup;

pub use popup::{Popup, PopupConfig, PopupConfigError, PopupConfigParse};
