#![forbid(unsafe_code)]

//! Visibility-tracking capability.
//!
//! The registry never talks to a host primitive directly. A
//! [`VisibilityBackend`] creates one [`VisibilityObserver`] per distinct
//! observer config and reports batches of [`IntersectionEntry`] values to the
//! handler it was created with.
//!
//! # Contract for implementors
//!
//! 1. The handler is never invoked from inside `create_observer`, `observe`,
//!    `unobserve` or `disconnect`; reports are delivered later, from the
//!    host's event delivery (for [`SimulatedBackend`], from `flush`).
//! 2. After `disconnect`, the handler is not invoked again.
//! 3. Entries within one batch are delivered in the order the backend
//!    produced them.

mod simulated;
mod unsupported;

pub use simulated::SimulatedBackend;
pub use unsupported::UnsupportedBackend;

use std::rc::Rc;

use crate::config::ObserverConfig;
use crate::element::ElementRef;
use crate::entry::IntersectionEntry;

/// Receives every batch reported by one observer.
pub type NotifyHandler = Rc<dyn Fn(&[IntersectionEntry])>;

/// One underlying observer, bound to a single config.
pub trait VisibilityObserver {
    /// Start reporting visibility changes for `target`.
    fn observe(&self, target: &ElementRef);

    /// Stop reporting for `target`.
    fn unobserve(&self, target: &ElementRef);

    /// Stop reporting for every target; the observer is dead afterwards.
    fn disconnect(&self);
}

/// Host capability that creates visibility observers.
pub trait VisibilityBackend {
    /// Whether this host can track visibility at all.
    ///
    /// When `false`, the registry never calls [`Self::create_observer`] and
    /// answers every subscription with a single synthesized report instead.
    fn is_supported(&self) -> bool {
        true
    }

    /// Create an observer configured with exactly `config`.
    fn create_observer(
        &self,
        config: &ObserverConfig,
        handler: NotifyHandler,
    ) -> Rc<dyn VisibilityObserver>;
}
