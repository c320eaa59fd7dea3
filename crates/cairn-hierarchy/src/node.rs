use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use cairn_store::{Model, Query};
use cairn_types::{ObjectId, Record, TypeResult};
use serde_json::Value;

use crate::engine::HierarchyEngine;
use crate::error::HierarchyResult;

/// Shared, immutable list of resolved nodes.
///
/// Cached views hand out clones of the same `Arc`, so two reads without an
/// intervening reset observe the same list instance.
pub type NodeList<M> = Arc<Vec<Arc<M>>>;

/// Lazily filled cache slot.
struct Slot<T>(RwLock<Option<T>>);

impl<T: Clone> Slot<T> {
    fn empty() -> Self {
        Self(RwLock::new(None))
    }

    fn get(&self) -> Option<T> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set(&self, value: T) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = Some(value);
    }

    fn clear(&self) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn is_filled(&self) -> bool {
        self.0.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }
}

/// Hierarchy state of one node: its parent reference plus cached views.
///
/// Embedded in each hierarchical model. Each cached view has its own reset
/// method; [`Hierarchy::set_master`] clears only the parent object and the
/// ancestor chain.
pub struct Hierarchy<M> {
    master: Option<ObjectId>,
    master_object: Slot<Arc<M>>,
    ancestors: Slot<NodeList<M>>,
    children: Slot<NodeList<M>>,
    siblings: Slot<NodeList<M>>,
}

impl<M> Hierarchy<M> {
    /// State for a node whose parent is `master` (normalized; blank is none).
    pub fn new(master: Option<ObjectId>) -> Self {
        Self {
            master: master.and_then(ObjectId::normalize),
            master_object: Slot::empty(),
            ancestors: Slot::empty(),
            children: Slot::empty(),
            siblings: Slot::empty(),
        }
    }

    /// Read the parent reference stored under `field` in `record`.
    pub fn from_record(record: &Record, field: &str) -> TypeResult<Self> {
        Ok(Self::new(record.get_id(field)?))
    }

    /// Write the parent reference into `record` under `field`.
    pub fn write_to(&self, record: &mut Record, field: &str) {
        let value = self.master.as_ref().map_or(Value::Null, ObjectId::to_value);
        record.set(field, value);
    }

    /// Identity of the immediate parent.
    pub fn master(&self) -> Option<&ObjectId> {
        self.master.as_ref()
    }

    pub fn has_master(&self) -> bool {
        self.master.is_some()
    }

    /// Reassign the parent reference.
    ///
    /// Clears the resolved parent and the ancestor chain. Cached children and
    /// siblings are kept.
    pub fn set_master(&mut self, master: Option<ObjectId>) {
        self.master = master.and_then(ObjectId::normalize);
        self.master_object.clear();
        self.reset_hierarchy();
    }

    /// Drop the cached ancestor chain.
    pub fn reset_hierarchy(&self) {
        self.ancestors.clear();
    }

    /// Drop the cached children list.
    pub fn reset_children(&self) {
        self.children.clear();
    }

    /// Drop the cached siblings list.
    pub fn reset_siblings(&self) {
        self.siblings.clear();
    }

    /// Drop every cached view.
    pub fn reset_all(&self) {
        self.master_object.clear();
        self.reset_hierarchy();
        self.reset_children();
        self.reset_siblings();
    }

    pub fn has_cached_ancestors(&self) -> bool {
        self.ancestors.is_filled()
    }

    pub fn has_cached_children(&self) -> bool {
        self.children.is_filled()
    }

    pub fn has_cached_siblings(&self) -> bool {
        self.siblings.is_filled()
    }

    pub(crate) fn cached_master_object(&self) -> Option<Arc<M>> {
        self.master_object.get()
    }

    pub(crate) fn cache_master_object(&self, node: Arc<M>) {
        self.master_object.set(node);
    }

    pub(crate) fn cached_ancestors(&self) -> Option<NodeList<M>> {
        self.ancestors.get()
    }

    pub(crate) fn cache_ancestors(&self, list: NodeList<M>) {
        self.ancestors.set(list);
    }

    pub(crate) fn cached_children(&self) -> Option<NodeList<M>> {
        self.children.get()
    }

    pub(crate) fn cache_children(&self, list: NodeList<M>) {
        self.children.set(list);
    }

    pub(crate) fn cached_siblings(&self) -> Option<NodeList<M>> {
        self.siblings.get()
    }

    pub(crate) fn cache_siblings(&self, list: NodeList<M>) {
        self.siblings.set(list);
    }
}

impl<M> Default for Hierarchy<M> {
    fn default() -> Self {
        Self::new(None)
    }
}

// Clones carry the parent reference only; caches start empty.
impl<M> Clone for Hierarchy<M> {
    fn clone(&self) -> Self {
        Self::new(self.master.clone())
    }
}

impl<M> fmt::Debug for Hierarchy<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hierarchy")
            .field("master", &self.master)
            .field("ancestors_cached", &self.has_cached_ancestors())
            .field("children_cached", &self.has_cached_children())
            .field("siblings_cached", &self.has_cached_siblings())
            .finish()
    }
}

/// A model that participates in a parent-pointer tree.
pub trait HierarchicalNode: Model {
    fn hierarchy(&self) -> &Hierarchy<Self>;

    fn hierarchy_mut(&mut self) -> &mut Hierarchy<Self>;

    /// Record field holding the parent identity.
    fn master_field(&self) -> &'static str {
        "master"
    }

    /// Query selecting the direct children of `parent`.
    ///
    /// Override to add ordering.
    fn children_query(&self, parent: &ObjectId) -> Query {
        Query::new(self.obj_type()).filter(self.master_field(), parent.to_value())
    }

    /// Load this node's direct children.
    fn load_children(
        &self,
        engine: &HierarchyEngine<Self>,
    ) -> HierarchyResult<Vec<Arc<Self>>> {
        engine.query_children(self)
    }
}
