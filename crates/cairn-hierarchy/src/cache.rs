//! Read-through object cache for hierarchy resolution.
//!
//! The engine consults the cache before the store whenever it resolves a
//! parent or child reference, and inserts everything it loads. Share one
//! `Arc<dyn ObjectCache<M>>` between engines to get process-wide reuse.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock};

use cairn_store::Model;
use cairn_types::{ObjType, ObjectId};
use serde::{Deserialize, Serialize};

type Key = (ObjType, ObjectId);

/// Cache of loaded nodes keyed by (type, id).
pub trait ObjectCache<M: Model>: Send + Sync {
    fn get(&self, obj_type: &ObjType, id: &ObjectId) -> Option<Arc<M>>;

    /// Insert `node` under its own type and id. Nodes without an id are ignored.
    fn put(&self, node: Arc<M>);

    fn remove(&self, obj_type: &ObjType, id: &ObjectId) -> Option<Arc<M>>;

    fn clear(&self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn key_of<M: Model>(node: &M) -> Option<Key> {
    node.id().map(|id| (node.obj_type(), id.clone()))
}

/// Unbounded cache. Entries live until removed or cleared.
pub struct MemoryObjectCache<M> {
    entries: RwLock<HashMap<Key, Arc<M>>>,
}

impl<M> MemoryObjectCache<M> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<M> Default for MemoryObjectCache<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> ObjectCache<M> for MemoryObjectCache<M> {
    fn get(&self, obj_type: &ObjType, id: &ObjectId) -> Option<Arc<M>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(&(obj_type.clone(), id.clone())).cloned()
    }

    fn put(&self, node: Arc<M>) {
        if let Some(key) = key_of(node.as_ref()) {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            entries.insert(key, node);
        }
    }

    fn remove(&self, obj_type: &ObjType, id: &ObjectId) -> Option<Arc<M>> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(&(obj_type.clone(), id.clone()))
    }

    fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl<M> std::fmt::Debug for MemoryObjectCache<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let len = self
            .entries
            .read()
            .map(|e| e.len())
            .unwrap_or_default();
        f.debug_struct("MemoryObjectCache").field("len", &len).finish()
    }
}

struct Fifo<M> {
    entries: HashMap<Key, Arc<M>>,
    order: VecDeque<Key>,
}

/// Cache holding at most `capacity` nodes, evicting the oldest insertion first.
///
/// Replacing an existing entry does not refresh its position.
pub struct BoundedObjectCache<M> {
    capacity: usize,
    inner: RwLock<Fifo<M>>,
}

impl<M> BoundedObjectCache<M> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: RwLock::new(Fifo {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<M: Model> ObjectCache<M> for BoundedObjectCache<M> {
    fn get(&self, obj_type: &ObjType, id: &ObjectId) -> Option<Arc<M>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.entries.get(&(obj_type.clone(), id.clone())).cloned()
    }

    fn put(&self, node: Arc<M>) {
        if self.capacity == 0 {
            return;
        }
        let Some(key) = key_of(node.as_ref()) else {
            return;
        };
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if inner.entries.insert(key.clone(), node).is_some() {
            return;
        }
        inner.order.push_back(key);
        while inner.order.len() > self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
            }
        }
    }

    fn remove(&self, obj_type: &ObjType, id: &ObjectId) -> Option<Arc<M>> {
        let key = (obj_type.clone(), id.clone());
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let removed = inner.entries.remove(&key);
        if removed.is_some() {
            inner.order.retain(|k| k != &key);
        }
        removed
    }

    fn clear(&self) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.entries.clear();
        inner.order.clear();
    }

    fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }
}

impl<M> std::fmt::Debug for BoundedObjectCache<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedObjectCache")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

/// Cache that stores nothing; every resolution goes to the store.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObjectCache;

impl<M: Model> ObjectCache<M> for NullObjectCache {
    fn get(&self, _obj_type: &ObjType, _id: &ObjectId) -> Option<Arc<M>> {
        None
    }

    fn put(&self, _node: Arc<M>) {}

    fn remove(&self, _obj_type: &ObjType, _id: &ObjectId) -> Option<Arc<M>> {
        None
    }

    fn clear(&self) {}

    fn len(&self) -> usize {
        0
    }
}

/// Lifetime policy for the object cache, selectable from configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum CachePolicy {
    /// Keep every loaded node for the life of the cache.
    #[default]
    Unbounded,
    /// Keep at most `capacity` nodes (FIFO eviction).
    Bounded { capacity: usize },
    /// Never cache.
    Disabled,
}

impl CachePolicy {
    /// Build a fresh cache implementing this policy.
    pub fn build<M: Model>(self) -> Arc<dyn ObjectCache<M>> {
        match self {
            Self::Unbounded => Arc::new(MemoryObjectCache::<M>::new()),
            Self::Bounded { capacity } => Arc::new(BoundedObjectCache::<M>::new(capacity)),
            Self::Disabled => Arc::new(NullObjectCache),
        }
    }
}
