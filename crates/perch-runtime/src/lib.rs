#![forbid(unsafe_code)]

//! Runtime: element identity, visibility backends, and the shared
//! subscription registry.
//!
//! # Role in perch
//! `perch-runtime` turns a host's visibility tracking into per-element
//! callbacks. Many popups can watch visibility under the same options; the
//! [`ObserverRegistry`] makes sure they share one backend observer and tears
//! it down when the last of them leaves.
//!
//! # How it fits in the system
//! Hosts implement [`VisibilityBackend`] (or use [`SimulatedBackend`] when
//! they own their layout). The placement controller in `perch-widgets`
//! subscribes its content element through the registry and reacts to each
//! [`IntersectionEntry`]. When the host has no visibility tracking at all,
//! [`UnsupportedBackend`] routes subscriptions through a degraded path that
//! reports "fully visible" once.

/// Visibility observer abstraction and the bundled backends.
pub mod backend;
/// Observation options, config identity, and root margin parsing.
pub mod config;
/// Element handles compared by identity.
pub mod element;
/// Visibility notification records.
pub mod entry;
/// Shared subscription registry.
pub mod registry;
/// Root element to numeric id table.
pub mod root_ids;

pub use backend::{
    NotifyHandler, SimulatedBackend, UnsupportedBackend, VisibilityBackend, VisibilityObserver,
};
pub use config::{ConfigId, MarginValue, ObserverConfig, RootMargin, RootMarginError};
pub use element::{BoxElement, Element, ElementRef, WeakElementRef};
pub use entry::IntersectionEntry;
pub use registry::{Callback, ObserverRegistry, RegistryError, Subscription};
pub use root_ids::{NO_ROOT_ID, RootIdTable};
