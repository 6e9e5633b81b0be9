#![forbid(unsafe_code)]

//! Identity-keyed element handles.
//!
//! The host owns its elements; the runtime only needs to read an element's
//! current box and to tell two elements apart. [`ElementRef`] wraps an
//! `Rc<dyn Element>` and compares and hashes by *allocation identity*, never
//! by value, so two distinct nodes with equal bounds are still different
//! keys.
//!
//! # Invariants
//!
//! 1. `a == b` iff both handles point at the same allocation.
//! 2. A [`WeakElementRef`] never keeps the element alive, but it does keep
//!    the allocation reserved, so its address cannot be reused by another
//!    element while the weak handle exists.

use std::cell::Cell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use perch_core::Rect;

/// A host node the runtime can measure.
pub trait Element {
    /// The element's current box in viewport coordinates.
    fn bounding_client_rect(&self) -> Rect;

    /// Optional human-readable name used in logs.
    fn label(&self) -> Option<String> {
        None
    }
}

/// Strong, identity-compared handle to a host element.
#[derive(Clone)]
pub struct ElementRef(Rc<dyn Element>);

impl ElementRef {
    /// Wrap a host element.
    #[must_use]
    pub fn new(element: impl Element + 'static) -> Self {
        Self(Rc::new(element))
    }

    /// Wrap an already shared host element.
    #[must_use]
    pub fn from_rc(element: Rc<dyn Element>) -> Self {
        Self(element)
    }

    /// The element's current box.
    #[must_use]
    pub fn bounding_client_rect(&self) -> Rect {
        self.0.bounding_client_rect()
    }

    #[must_use]
    pub fn label(&self) -> Option<String> {
        self.0.label()
    }

    /// Non-owning handle to the same element.
    #[must_use]
    pub fn downgrade(&self) -> WeakElementRef {
        WeakElementRef {
            ptr: Rc::downgrade(&self.0),
            addr: self.addr(),
        }
    }

    /// Allocation address, used as the identity key.
    #[must_use]
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0).cast::<()>().addr()
    }
}

impl<T: Element + 'static> From<Rc<T>> for ElementRef {
    fn from(value: Rc<T>) -> Self {
        Self(value)
    }
}

impl PartialEq for ElementRef {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for ElementRef {}

impl Hash for ElementRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label() {
            Some(label) => write!(f, "ElementRef({label})"),
            None => write!(f, "ElementRef({:#x})", self.addr()),
        }
    }
}

/// Non-owning counterpart of [`ElementRef`].
#[derive(Clone)]
pub struct WeakElementRef {
    ptr: Weak<dyn Element>,
    addr: usize,
}

impl WeakElementRef {
    /// Recover a strong handle if the element is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<ElementRef> {
        self.ptr.upgrade().map(ElementRef)
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.ptr.strong_count() > 0
    }

    /// Address of the element this handle was created from.
    #[must_use]
    pub fn addr(&self) -> usize {
        self.addr
    }
}

impl fmt::Debug for WeakElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakElementRef")
            .field("addr", &format_args!("{:#x}", self.addr))
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// A free-standing element whose box is set explicitly.
///
/// Useful for hosts that compute layout themselves, and for driving the
/// runtime in tests.
#[derive(Debug)]
pub struct BoxElement {
    name: String,
    bounds: Cell<Rect>,
}

impl BoxElement {
    #[must_use]
    pub fn new(name: impl Into<String>, bounds: Rect) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            bounds: Cell::new(bounds),
        })
    }

    pub fn set_bounds(&self, bounds: Rect) {
        self.bounds.set(bounds);
    }

    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.bounds.get()
    }

    /// Move the box, keeping its size. Mirrors a scroll of the page.
    pub fn translate(&self, dx: f64, dy: f64) {
        let b = self.bounds.get();
        self.bounds.set(Rect::new(b.x + dx, b.y + dy, b.width, b.height));
    }
}

impl Element for BoxElement {
    fn bounding_client_rect(&self) -> Rect {
        self.bounds.get()
    }

    fn label(&self) -> Option<String> {
        Some(self.name.clone())
    }
}
