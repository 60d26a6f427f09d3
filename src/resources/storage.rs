use std::sync::Arc;

use parking_lot::RwLock;
use slotmap::{Key, SlotMap};

/// Thread-safe slot storage for one resource type.
///
/// Handles stay stable across insertions and removals; a removed handle
/// never resolves again.
pub struct ResourceStorage<H: Key, T> {
    inner: RwLock<SlotMap<H, Arc<T>>>,
}

impl<H: Key, T> Default for ResourceStorage<H, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Key, T> ResourceStorage<H, T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(SlotMap::with_key()),
        }
    }

    pub fn add(&self, resource: impl Into<T>) -> H {
        self.inner.write().insert(Arc::new(resource.into()))
    }

    /// Returns a shared reference to the resource.
    pub fn get(&self, handle: H) -> Option<Arc<T>> {
        self.inner.read().get(handle).cloned()
    }

    pub fn contains(&self, handle: H) -> bool {
        self.inner.read().contains_key(handle)
    }

    /// Removes the resource; `None` if it was already gone.
    pub fn remove(&self, handle: H) -> Option<Arc<T>> {
        self.inner.write().remove(handle)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
