#![forbid(unsafe_code)]

//! In-process visibility tracking driven by explicit flushes.
//!
//! [`SimulatedBackend`] computes intersections itself from element boxes.
//! Hosts that own their layout (and tests) call [`SimulatedBackend::flush`]
//! after every scroll or resize; each live observer then reports the targets
//! whose visibility crossed its threshold since the previous flush.
//!
//! # Reporting rule
//!
//! For each observed target:
//!
//! 1. root box = the config's root element box, or the flushed viewport,
//!    grown by the parsed root margin (percentages resolve against the root
//!    box).
//! 2. ratio = visible area / target area. A zero-area target counts as fully
//!    visible when it touches the root box and invisible otherwise.
//! 3. A target is "past threshold" when `ratio >= threshold`, or, with a
//!    threshold of 0 (the default), when it touches the root box at all.
//! 4. A report is produced on the first flush after `observe`, then only
//!    when the past-threshold state flips.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use perch_core::Rect;
use tracing::{trace, warn};
use web_time::Instant;

use super::{NotifyHandler, VisibilityBackend, VisibilityObserver};
use crate::config::{ObserverConfig, RootMargin};
use crate::element::ElementRef;
use crate::entry::IntersectionEntry;

/// Visibility backend that computes reports on demand.
///
/// Cloning creates a new handle to the **same** backend.
#[derive(Clone)]
pub struct SimulatedBackend {
    inner: Rc<BackendInner>,
}

struct BackendInner {
    observers: RefCell<Vec<Weak<SimulatedObserver>>>,
    next_serial: Cell<u64>,
    origin: Instant,
}

impl std::fmt::Debug for SimulatedBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedBackend")
            .field("live_observers", &self.live_observer_count())
            .finish()
    }
}

impl Default for SimulatedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedBackend {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(BackendInner {
                observers: RefCell::new(Vec::new()),
                next_serial: Cell::new(0),
                origin: Instant::now(),
            }),
        }
    }

    /// Evaluate every live observer against `viewport` and deliver reports
    /// stamped with `time` (milliseconds).
    ///
    /// Returns the number of entries delivered.
    pub fn flush(&self, viewport: Rect, time: f64) -> usize {
        let observers = self.live_observers();
        let mut delivered = 0;
        for observer in observers {
            // An earlier handler in this flush may have disconnected it.
            if !observer.connected.get() {
                continue;
            }
            let batch = observer.collect(viewport, time);
            if batch.is_empty() {
                continue;
            }
            delivered += batch.len();
            trace!(
                observer = observer.serial,
                entries = batch.len(),
                "simulated observer: deliver"
            );
            (observer.handler)(batch.as_slice());
        }
        delivered
    }

    /// [`Self::flush`] stamped with the time elapsed since this backend was
    /// created.
    pub fn flush_now(&self, viewport: Rect) -> usize {
        let time = self.inner.origin.elapsed().as_secs_f64() * 1000.0;
        self.flush(viewport, time)
    }

    /// Observers that are still connected and referenced by their owner.
    #[must_use]
    pub fn live_observer_count(&self) -> usize {
        self.inner
            .observers
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .filter(|o| o.connected.get())
            .count()
    }

    /// Targets observed across all live observers.
    #[must_use]
    pub fn observed_target_count(&self) -> usize {
        self.live_observers()
            .iter()
            .map(|o| o.targets.borrow().len())
            .sum()
    }

    /// Upgrade live observers, pruning the dead ones.
    fn live_observers(&self) -> Vec<Rc<SimulatedObserver>> {
        let mut observers = self.inner.observers.borrow_mut();
        prune(&mut observers);
        observers.iter().filter_map(Weak::upgrade).collect()
    }
}

/// Drop slots whose observer was released or disconnected.
fn prune(observers: &mut Vec<Weak<SimulatedObserver>>) {
    observers.retain(|weak| weak.upgrade().is_some_and(|o| o.connected.get()));
}

impl VisibilityBackend for SimulatedBackend {
    fn create_observer(
        &self,
        config: &ObserverConfig,
        handler: NotifyHandler,
    ) -> Rc<dyn VisibilityObserver> {
        let margin = config.parsed_root_margin().unwrap_or_else(|err| {
            warn!(
                root_margin = config.root_margin.as_deref().unwrap_or_default(),
                error = %err,
                "simulated observer: ignoring invalid root margin"
            );
            RootMargin::default()
        });
        let serial = self.inner.next_serial.get();
        self.inner.next_serial.set(serial + 1);
        let observer = Rc::new(SimulatedObserver {
            serial,
            root: config.root.clone(),
            margin,
            threshold: config.threshold.unwrap_or(0.0),
            handler,
            targets: RefCell::new(Vec::new()),
            connected: Cell::new(true),
        });
        let mut observers = self.inner.observers.borrow_mut();
        prune(&mut observers);
        observers.push(Rc::downgrade(&observer));
        drop(observers);
        observer
    }
}

struct Target {
    element: ElementRef,
    /// Past-threshold state at the last report; `None` until first reported.
    reported: Option<bool>,
}

struct SimulatedObserver {
    serial: u64,
    root: Option<ElementRef>,
    margin: RootMargin,
    threshold: f64,
    handler: NotifyHandler,
    targets: RefCell<Vec<Target>>,
    connected: Cell<bool>,
}

impl SimulatedObserver {
    fn collect(&self, viewport: Rect, time: f64) -> Vec<IntersectionEntry> {
        let root = self
            .root
            .as_ref()
            .map_or(viewport, ElementRef::bounding_client_rect);
        let root_bounds = root.inflate(self.margin.resolve(root));

        let mut targets = self.targets.borrow_mut();
        let mut batch = Vec::new();
        for target in targets.iter_mut() {
            let bounds = target.element.bounding_client_rect();
            let overlap = bounds.intersection(&root_bounds);
            let ratio = match overlap {
                Some(visible) if bounds.area() > 0.0 => (visible.area() / bounds.area()).min(1.0),
                Some(_) => 1.0,
                None => 0.0,
            };
            let past = if self.threshold > 0.0 {
                ratio >= self.threshold
            } else {
                overlap.is_some()
            };
            if target.reported == Some(past) {
                continue;
            }
            target.reported = Some(past);
            batch.push(IntersectionEntry {
                target: target.element.clone(),
                bounding_client_rect: bounds,
                intersection_rect: overlap.unwrap_or_default(),
                root_bounds: Some(root_bounds),
                intersection_ratio: ratio,
                is_intersecting: overlap.is_some(),
                time,
            });
        }
        batch
    }
}

impl VisibilityObserver for SimulatedObserver {
    fn observe(&self, target: &ElementRef) {
        if !self.connected.get() {
            return;
        }
        let mut targets = self.targets.borrow_mut();
        if targets.iter().all(|t| t.element != *target) {
            targets.push(Target {
                element: target.clone(),
                reported: None,
            });
        }
    }

    fn unobserve(&self, target: &ElementRef) {
        self.targets.borrow_mut().retain(|t| t.element != *target);
    }

    fn disconnect(&self) {
        self.connected.set(false);
        self.targets.borrow_mut().clear();
    }
}
