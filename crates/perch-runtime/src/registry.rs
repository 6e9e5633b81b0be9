#![forbid(unsafe_code)]

//! Shared visibility subscriptions.
//!
//! # Design
//!
//! [`ObserverRegistry`] keeps one backend observer per distinct
//! [`ObserverConfig`] identity and fans each report out to every callback
//! registered for the reported element. Popups that share a config therefore
//! share a single underlying observer.
//!
//! State lives in `Rc<RefCell<..>>` and is only touched from the host's
//! event-delivery context. Cloning the registry creates another handle to
//! the same state.
//!
//! # Invariants
//!
//! 1. At most one observer entry exists per config id.
//! 2. An element is active in at most one entry.
//! 3. An active element always has at least one callback; removing the last
//!    callback unobserves the element, and removing the last element
//!    disconnects the observer and drops the entry.
//! 4. Within a batch, callbacks run in delivery order, then registration
//!    order per element. No registry borrow is held while a callback runs.
//! 5. Reports from an observer whose entry was torn down are ignored, even
//!    if a new entry with the same id exists.
//!
//! # Failure Modes
//!
//! - **Element under two configs**: rejected with
//!   [`RegistryError::ElementAlreadyObserved`].
//! - **Unsubscribe during dispatch**: allowed; the removed callback is not
//!   invoked for the rest of the batch.
//! - **Unsubscribe after teardown or dispose**: no-op.

use std::cell::RefCell;
use std::fmt;
use std::mem;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::backend::{NotifyHandler, VisibilityBackend, VisibilityObserver};
use crate::config::{ConfigId, ObserverConfig};
use crate::element::ElementRef;
use crate::entry::IntersectionEntry;
use crate::root_ids::{NO_ROOT_ID, RootIdTable};

/// Callback invoked with each report for its element.
pub type Callback = Rc<dyn Fn(&IntersectionEntry)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CallbackKey(u64);

struct Registered {
    key: CallbackKey,
    callback: Callback,
}

struct ObserverEntry {
    generation: u64,
    observer: Rc<dyn VisibilityObserver>,
    elements: FxHashMap<ElementRef, Vec<Registered>>,
}

struct RegistryInner {
    backend: Rc<dyn VisibilityBackend>,
    roots: RootIdTable,
    entries: FxHashMap<ConfigId, ObserverEntry>,
    /// Which entry each active element belongs to.
    owners: FxHashMap<ElementRef, ConfigId>,
    next_generation: u64,
    next_callback: u64,
}

fn format_config_id(root_id: u64, config: &ObserverConfig) -> ConfigId {
    // Keys in sorted order: root, rootMargin, threshold.
    let mut parts = Vec::with_capacity(3);
    parts.push(format!("root_{root_id}"));
    if let Some(margin) = &config.root_margin {
        parts.push(format!("rootMargin_{margin}"));
    }
    if let Some(threshold) = config.threshold {
        // -0.0 formats as "-0".
        parts.push(format!("threshold_{}", threshold + 0.0));
    }
    ConfigId::new(parts.join(","))
}

impl RegistryInner {
    fn config_id(&mut self, config: &ObserverConfig) -> ConfigId {
        let root_id = self.roots.id_for(config.root.as_ref());
        format_config_id(root_id, config)
    }

    /// Id `config` would have, or `None` when its root was never assigned
    /// one (so no entry can exist for it).
    fn peek_config_id(&self, config: &ObserverConfig) -> Option<ConfigId> {
        let root_id = match &config.root {
            Some(root) => self.roots.get(root)?,
            None => NO_ROOT_ID,
        };
        Some(format_config_id(root_id, config))
    }

    fn live_entry(&self, id: &ConfigId, generation: u64) -> Option<&ObserverEntry> {
        self.entries
            .get(id)
            .filter(|entry| entry.generation == generation)
    }

    fn callbacks_for(
        &self,
        id: &ConfigId,
        generation: u64,
        target: &ElementRef,
    ) -> Vec<(CallbackKey, Callback)> {
        self.live_entry(id, generation)
            .and_then(|entry| entry.elements.get(target))
            .map(|list| {
                list.iter()
                    .map(|r| (r.key, Rc::clone(&r.callback)))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn is_registered(
        &self,
        id: &ConfigId,
        generation: u64,
        target: &ElementRef,
        key: CallbackKey,
    ) -> bool {
        self.live_entry(id, generation)
            .and_then(|entry| entry.elements.get(target))
            .is_some_and(|list| list.iter().any(|r| r.key == key))
    }
}

impl Drop for RegistryInner {
    fn drop(&mut self) {
        for entry in self.entries.values() {
            entry.observer.disconnect();
        }
    }
}

/// Why a subscription was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The element is already active under a different config.
    ElementAlreadyObserved {
        existing: ConfigId,
        requested: ConfigId,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ElementAlreadyObserved {
                existing,
                requested,
            } => write!(
                f,
                "element already observed under '{existing}', cannot also observe under '{requested}'"
            ),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Multiplexes visibility observers across subscribers sharing a config.
#[derive(Clone)]
pub struct ObserverRegistry {
    inner: Rc<RefCell<RegistryInner>>,
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ObserverRegistry")
            .field("entries", &inner.entries.len())
            .field("observed_elements", &inner.owners.len())
            .finish()
    }
}

impl ObserverRegistry {
    /// Create an isolated registry on top of `backend`.
    #[must_use]
    pub fn new(backend: impl VisibilityBackend + 'static) -> Self {
        Self::with_backend(Rc::new(backend))
    }

    /// Create a registry sharing an existing backend handle.
    #[must_use]
    pub fn with_backend(backend: Rc<dyn VisibilityBackend>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(RegistryInner {
                backend,
                roots: RootIdTable::new(),
                entries: FxHashMap::default(),
                owners: FxHashMap::default(),
                next_generation: 0,
                next_callback: 0,
            })),
        }
    }

    /// Identity string for `config`.
    ///
    /// Defined fields in sorted key order (`root`, `rootMargin`,
    /// `threshold`), each as `key_value`, joined with `,`. The root is
    /// replaced by its id from the root identity table; unset margin and
    /// threshold are omitted.
    ///
    /// The `root` key is always present: a config without a root yields
    /// `root_0`, so `{threshold: 1}` is `root_0,threshold_1`. Assigns an id
    /// to a root seen for the first time.
    #[must_use]
    pub fn config_id(&self, config: &ObserverConfig) -> ConfigId {
        self.inner.borrow_mut().config_id(config)
    }

    /// Register `callback` for visibility reports on `element`.
    ///
    /// If the backend cannot track visibility, `callback` is invoked once,
    /// right away, with a synthesized fully-visible report and the returned
    /// subscription does nothing.
    pub fn subscribe<F>(
        &self,
        element: &ElementRef,
        config: &ObserverConfig,
        callback: F,
    ) -> Result<Subscription, RegistryError>
    where
        F: Fn(&IntersectionEntry) + 'static,
    {
        let backend = Rc::clone(&self.inner.borrow().backend);
        if !backend.is_supported() {
            debug!(
                element = ?element,
                "visibility tracking unavailable; reporting fully visible"
            );
            callback(&IntersectionEntry::synthesized(element, config.threshold));
            return Ok(Subscription::detached());
        }

        let (registration, observer, first) = {
            let mut guard = self.inner.borrow_mut();
            let state = &mut *guard;
            let id = state.config_id(config);

            if let Some(existing) = state.owners.get(element) {
                if *existing != id {
                    warn!(
                        element = ?element,
                        existing = %existing,
                        requested = %id,
                        "subscription rejected: element observed under another config"
                    );
                    return Err(RegistryError::ElementAlreadyObserved {
                        existing: existing.clone(),
                        requested: id,
                    });
                }
            }

            let key = CallbackKey(state.next_callback);
            state.next_callback += 1;

            let next_generation = &mut state.next_generation;
            let inner = Rc::downgrade(&self.inner);
            let entry = state.entries.entry(id.clone()).or_insert_with(|| {
                let generation = *next_generation;
                *next_generation += 1;
                debug!(config_id = %id, generation, "observer entry created");
                let handler = dispatch_handler(inner, id.clone(), generation);
                ObserverEntry {
                    generation,
                    observer: backend.create_observer(config, handler),
                    elements: FxHashMap::default(),
                }
            });

            let callbacks = entry.elements.entry(element.clone()).or_default();
            let first = callbacks.is_empty();
            callbacks.push(Registered {
                key,
                callback: Rc::new(callback),
            });
            let observer = Rc::clone(&entry.observer);
            let generation = entry.generation;
            if first {
                state.owners.insert(element.clone(), id.clone());
            }

            let registration = Registration {
                registry: Rc::downgrade(&self.inner),
                id,
                generation,
                element: element.clone(),
                key,
            };
            (registration, observer, first)
        };

        if first {
            observer.observe(element);
        }
        Ok(Subscription {
            registration: RefCell::new(Some(registration)),
        })
    }

    /// Number of live observer entries.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    /// Whether an entry exists for `config`.
    #[must_use]
    pub fn has_entry(&self, config: &ObserverConfig) -> bool {
        let inner = self.inner.borrow();
        inner
            .peek_config_id(config)
            .is_some_and(|id| inner.entries.contains_key(&id))
    }

    /// Number of elements currently observed across all entries.
    #[must_use]
    pub fn observed_element_count(&self) -> usize {
        self.inner.borrow().owners.len()
    }

    #[must_use]
    pub fn is_observed(&self, element: &ElementRef) -> bool {
        self.inner.borrow().owners.contains_key(element)
    }

    /// Number of callbacks registered for `element`.
    #[must_use]
    pub fn callback_count(&self, element: &ElementRef) -> usize {
        let inner = self.inner.borrow();
        inner
            .owners
            .get(element)
            .and_then(|id| inner.entries.get(id))
            .and_then(|entry| entry.elements.get(element))
            .map_or(0, Vec::len)
    }

    /// Disconnect every observer and forget all registrations.
    ///
    /// Outstanding [`Subscription`]s become no-ops. The registry stays
    /// usable; later subscriptions start fresh entries.
    pub fn dispose(&self) {
        let (entries, owners) = {
            let mut inner = self.inner.borrow_mut();
            (mem::take(&mut inner.entries), mem::take(&mut inner.owners))
        };
        for (id, entry) in &entries {
            entry.observer.disconnect();
            debug!(config_id = %id, generation = entry.generation, "observer entry disposed");
        }
        drop(owners);
        drop(entries);
    }
}

fn dispatch_handler(
    registry: Weak<RefCell<RegistryInner>>,
    id: ConfigId,
    generation: u64,
) -> NotifyHandler {
    Rc::new(move |batch: &[IntersectionEntry]| {
        let Some(inner) = registry.upgrade() else {
            return;
        };
        for report in batch {
            let snapshot = match inner.try_borrow() {
                Ok(state) => state.callbacks_for(&id, generation, &report.target),
                Err(_) => {
                    warn!(config_id = %id, "registry busy; dropping visibility batch");
                    return;
                }
            };
            for (key, callback) in snapshot {
                let live = inner
                    .try_borrow()
                    .is_ok_and(|state| state.is_registered(&id, generation, &report.target, key));
                if live {
                    callback(report);
                }
            }
        }
    })
}

/// Identifies one callback inside the registry.
struct Registration {
    registry: Weak<RefCell<RegistryInner>>,
    id: ConfigId,
    generation: u64,
    element: ElementRef,
    key: CallbackKey,
}

impl Registration {
    fn release(self) {
        let Some(inner) = self.registry.upgrade() else {
            return;
        };
        let (removed, unobserve, teardown) = {
            let Ok(mut guard) = inner.try_borrow_mut() else {
                warn!(config_id = %self.id, "registry busy; unsubscribe skipped");
                return;
            };
            let state = &mut *guard;
            let Some(entry) = state.entries.get_mut(&self.id) else {
                return;
            };
            if entry.generation != self.generation {
                return;
            }
            let Some(list) = entry.elements.get_mut(&self.element) else {
                return;
            };
            let Some(pos) = list.iter().position(|r| r.key == self.key) else {
                return;
            };
            let removed = list.remove(pos);

            let mut unobserve = None;
            if list.is_empty() {
                entry.elements.remove(&self.element);
                state.owners.remove(&self.element);
                unobserve = Some(Rc::clone(&entry.observer));
            }
            let teardown = if entry.elements.is_empty() {
                state.entries.remove(&self.id)
            } else {
                None
            };
            (removed, unobserve, teardown)
        };

        if let Some(observer) = unobserve {
            observer.unobserve(&self.element);
        }
        if let Some(entry) = teardown {
            entry.observer.disconnect();
            debug!(config_id = %self.id, generation = entry.generation, "observer entry removed");
        }
        drop(removed);
    }
}

/// Handle for one registered callback.
///
/// [`Subscription::unsubscribe`] removes the callback; calling it again is a
/// no-op. Dropping the handle unsubscribes as well.
#[must_use = "dropping a Subscription unsubscribes its callback"]
pub struct Subscription {
    registration: RefCell<Option<Registration>>,
}

impl Subscription {
    /// A subscription with nothing to release.
    fn detached() -> Self {
        Self {
            registration: RefCell::new(None),
        }
    }

    /// Remove the callback. Idempotent.
    pub fn unsubscribe(&self) {
        let taken = self.registration.borrow_mut().take();
        if let Some(registration) = taken {
            registration.release();
        }
    }

    /// `true` until [`Self::unsubscribe`] runs. Always `false` for the
    /// subscription returned on the degraded path.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.registration.borrow().is_some()
    }

    /// Id of the config this callback is registered under.
    #[must_use]
    pub fn config_id(&self) -> Option<ConfigId> {
        self.registration.borrow().as_ref().map(|r| r.id.clone())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("config_id", &self.config_id())
            .finish_non_exhaustive()
    }
}
