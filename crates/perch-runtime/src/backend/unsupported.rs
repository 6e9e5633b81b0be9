#![forbid(unsafe_code)]

use std::rc::Rc;

use super::{NotifyHandler, VisibilityBackend, VisibilityObserver};
use crate::config::ObserverConfig;
use crate::element::ElementRef;

/// Backend for hosts without visibility tracking.
///
/// Drives the registry's degraded path: each subscription receives one
/// synthesized "fully visible" report and nothing afterwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedBackend;

impl VisibilityBackend for UnsupportedBackend {
    fn is_supported(&self) -> bool {
        false
    }

    fn create_observer(
        &self,
        _config: &ObserverConfig,
        _handler: NotifyHandler,
    ) -> Rc<dyn VisibilityObserver> {
        Rc::new(InertObserver)
    }
}

/// Observer that never reports.
struct InertObserver;

impl VisibilityObserver for InertObserver {
    fn observe(&self, _target: &ElementRef) {}

    fn unobserve(&self, _target: &ElementRef) {}

    fn disconnect(&self) {}
}
