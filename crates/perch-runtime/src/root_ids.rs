#![forbid(unsafe_code)]

//! Weak identity table mapping root elements to small numeric ids.
//!
//! # Invariants
//!
//! 1. Id `0` is reserved for "no explicit root" and never handed out.
//! 2. The same live element always maps to the same id.
//! 3. Distinct elements never share an id; ids increase monotonically and
//!    are not recycled.
//! 4. The table never keeps a root alive. Entries for dropped roots are
//!    pruned lazily when a new root is assigned.

use rustc_hash::FxHashMap;

use crate::element::{ElementRef, WeakElementRef};

/// Id used when a config has no explicit root.
pub const NO_ROOT_ID: u64 = 0;

#[derive(Debug)]
pub struct RootIdTable {
    ids: FxHashMap<usize, (WeakElementRef, u64)>,
    next: u64,
}

impl Default for RootIdTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RootIdTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ids: FxHashMap::default(),
            next: NO_ROOT_ID + 1,
        }
    }

    /// Id for `root`, assigning a fresh one on first sight.
    pub fn id_for(&mut self, root: Option<&ElementRef>) -> u64 {
        let Some(root) = root else {
            return NO_ROOT_ID;
        };
        if let Some(id) = self.get(root) {
            return id;
        }
        self.prune();
        let addr = root.addr();
        let id = self.next;
        self.next += 1;
        self.ids.insert(addr, (root.downgrade(), id));
        id
    }

    /// Id previously assigned to `root`, without assigning one.
    #[must_use]
    pub fn get(&self, root: &ElementRef) -> Option<u64> {
        self.ids
            .get(&root.addr())
            .filter(|(weak, _)| weak.is_alive())
            .map(|(_, id)| *id)
    }

    /// Drop entries whose root is gone.
    pub fn prune(&mut self) {
        self.ids.retain(|_, (weak, _)| weak.is_alive());
    }

    /// Number of tracked roots, including dead ones not yet pruned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
