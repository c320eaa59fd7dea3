//! Traversal and mutation of parent-pointer hierarchies.
//!
//! [`HierarchyEngine`] owns the collaborators (store, factory, object cache,
//! sibling strategy). Per-node results are cached on the node's
//! [`Hierarchy`](crate::Hierarchy) state, so the same node instance answers
//! repeated questions without further store round-trips.

use std::collections::HashSet;
use std::sync::Arc;

use cairn_store::{ModelFactory, ModelLoader, ObjectStore, Query};
use cairn_types::{ObjType, ObjectId};
use serde_json::Value;
use tracing::{debug, trace};

use crate::cache::{MemoryObjectCache, ObjectCache};
use crate::error::{HierarchyError, HierarchyResult};
use crate::node::{HierarchicalNode, NodeList};
use crate::reference::NodeRef;
use crate::siblings::{ParentChildren, SiblingsStrategy};

/// Hierarchy operations over nodes of type `M`.
///
/// An engine built with [`HierarchyEngine::new`] has no store or factory.
/// Operations that need one fail with [`HierarchyError::NotConfigured`] the
/// first time they miss the cache.
pub struct HierarchyEngine<M: HierarchicalNode> {
    store: Option<Arc<dyn ObjectStore>>,
    factory: Option<Arc<dyn ModelFactory>>,
    cache: Arc<dyn ObjectCache<M>>,
    siblings: Arc<dyn SiblingsStrategy<M>>,
}

impl<M: HierarchicalNode> HierarchyEngine<M> {
    /// Unconfigured engine with an unbounded cache and the parent-children
    /// sibling strategy.
    pub fn new() -> Self {
        Self {
            store: None,
            factory: None,
            cache: Arc::new(MemoryObjectCache::new()),
            siblings: Arc::new(ParentChildren),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_factory(mut self, factory: Arc<dyn ModelFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn ObjectCache<M>>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_siblings_strategy(mut self, strategy: Arc<dyn SiblingsStrategy<M>>) -> Self {
        self.siblings = strategy;
        self
    }

    pub fn cache(&self) -> &Arc<dyn ObjectCache<M>> {
        &self.cache
    }

    fn loader(&self) -> HierarchyResult<ModelLoader> {
        let store = self
            .store
            .clone()
            .ok_or(HierarchyError::NotConfigured("object store"))?;
        let factory = self
            .factory
            .clone()
            .ok_or(HierarchyError::NotConfigured("model factory"))?;
        Ok(ModelLoader::new(store, factory))
    }

    // ---------------------------------------------------------------
    // Resolution
    // ---------------------------------------------------------------

    /// Resolve a reference to a loaded node of type `obj_type`.
    ///
    /// Nodes of the right type are returned as-is, saved or not. Ids and
    /// records are looked up in the object cache, then in the store; those
    /// without an identity resolve to `None`.
    pub fn resolve(
        &self,
        obj_type: &ObjType,
        reference: &NodeRef<M>,
    ) -> HierarchyResult<Option<Arc<M>>> {
        let id = reference.identity(obj_type)?;
        match (reference, id) {
            (NodeRef::ByNode(node), _) => Ok(Some(Arc::clone(node))),
            (_, None) => Ok(None),
            (_, Some(id)) => self.resolve_id(obj_type, &id),
        }
    }

    fn resolve_id(&self, obj_type: &ObjType, id: &ObjectId) -> HierarchyResult<Option<Arc<M>>> {
        if let Some(hit) = self.cache.get(obj_type, id) {
            trace!(obj_type = %obj_type, id = %id, "object cache hit");
            return Ok(Some(hit));
        }
        debug!(obj_type = %obj_type, id = %id, "loading node from store");
        let loaded = self.loader()?.load::<M>(obj_type, Some(id))?;
        let Some(node) = loaded.filter(|n| n.id().is_some()) else {
            return Ok(None);
        };
        let node = Arc::new(node);
        self.cache.put(Arc::clone(&node));
        Ok(Some(node))
    }

    fn query_nodes(&self, query: &Query) -> HierarchyResult<Vec<Arc<M>>> {
        debug!(obj_type = %query.obj_type, filters = query.filters.len(), "querying nodes");
        let nodes = self.loader()?.query::<M>(query)?;
        Ok(nodes
            .into_iter()
            .map(|node| {
                let node = Arc::new(node);
                self.cache.put(Arc::clone(&node));
                node
            })
            .collect())
    }

    // ---------------------------------------------------------------
    // Parent and ancestors
    // ---------------------------------------------------------------

    /// Reassign `node`'s parent.
    ///
    /// Rejects a reference to the node itself before changing any state.
    /// Only the parent object and ancestor caches are invalidated.
    pub fn set_parent(&self, node: &mut M, parent: Option<&NodeRef<M>>) -> HierarchyResult<()> {
        let master = match parent {
            Some(reference) => reference.identity(&node.obj_type())?,
            None => None,
        };
        if let (Some(master), Some(id)) = (&master, node.id()) {
            if master == id {
                return Err(HierarchyError::SelfParent(id.clone()));
            }
        }
        node.hierarchy_mut().set_master(master);
        Ok(())
    }

    /// The resolved immediate parent, cached on the node.
    pub fn parent(&self, node: &M) -> HierarchyResult<Option<Arc<M>>> {
        let state = node.hierarchy();
        if let Some(cached) = state.cached_master_object() {
            return Ok(Some(cached));
        }
        let Some(master) = state.master() else {
            return Ok(None);
        };
        let Some(parent) = self.resolve_id(&node.obj_type(), master)? else {
            return Ok(None);
        };
        if let Some(id) = node.id() {
            if parent.id() == Some(id) {
                return Err(HierarchyError::SelfParent(id.clone()));
            }
        }
        state.cache_master_object(Arc::clone(&parent));
        Ok(Some(parent))
    }

    /// Whether the parent reference resolves to a stored node.
    pub fn has_master_object(&self, node: &M) -> HierarchyResult<bool> {
        Ok(self.parent(node)?.is_some())
    }

    /// Ancestors from the immediate parent up to the top-level node.
    pub fn ancestors(&self, node: &M) -> HierarchyResult<NodeList<M>> {
        if let Some(cached) = node.hierarchy().cached_ancestors() {
            return Ok(cached);
        }
        let mut seen: HashSet<ObjectId> = node.id().cloned().into_iter().collect();
        let mut chain = Vec::new();
        let mut current = self.parent(node)?;
        while let Some(ancestor) = current {
            if let Some(id) = ancestor.id() {
                if !seen.insert(id.clone()) {
                    return Err(HierarchyError::CycleDetected(id.clone()));
                }
            }
            current = self.parent(&ancestor)?;
            chain.push(ancestor);
        }
        let chain = Arc::new(chain);
        node.hierarchy().cache_ancestors(Arc::clone(&chain));
        Ok(chain)
    }

    /// Ancestors from the top-level node down to the immediate parent.
    pub fn inverted_ancestors(&self, node: &M) -> HierarchyResult<Vec<Arc<M>>> {
        let mut chain = self.ancestors(node)?.to_vec();
        chain.reverse();
        Ok(chain)
    }

    /// The top-level ancestor, or `None` if `node` is itself top-level.
    pub fn top_level_ancestor(&self, node: &M) -> HierarchyResult<Option<Arc<M>>> {
        Ok(self.ancestors(node)?.last().cloned())
    }

    /// Depth in the tree; top-level nodes are level 1.
    pub fn level(&self, node: &M) -> HierarchyResult<usize> {
        Ok(self.ancestors(node)?.len() + 1)
    }

    pub fn has_parents(&self, node: &M) -> HierarchyResult<bool> {
        Ok(!self.ancestors(node)?.is_empty())
    }

    /// Whether `node` has no parent reference. Does not touch the store.
    pub fn is_top_level(&self, node: &M) -> bool {
        !node.hierarchy().has_master()
    }

    // ---------------------------------------------------------------
    // Children
    // ---------------------------------------------------------------

    /// Direct children, loaded once through [`HierarchicalNode::load_children`].
    pub fn children(&self, node: &M) -> HierarchyResult<NodeList<M>> {
        if let Some(cached) = node.hierarchy().cached_children() {
            return Ok(cached);
        }
        let children = Arc::new(node.load_children(self)?);
        node.hierarchy().cache_children(Arc::clone(&children));
        Ok(children)
    }

    /// Query the store for `node`'s direct children, bypassing node caches.
    ///
    /// An unsaved node has no children.
    pub fn query_children(&self, node: &M) -> HierarchyResult<Vec<Arc<M>>> {
        let Some(id) = node.id() else {
            return Ok(Vec::new());
        };
        self.query_nodes(&node.children_query(id))
    }

    /// Query the store for every node of `node`'s type without a parent.
    pub fn query_top_level(&self, node: &M) -> HierarchyResult<Vec<Arc<M>>> {
        let query = Query::new(node.obj_type()).filter(node.master_field(), Value::Null);
        self.query_nodes(&query)
    }

    pub fn has_children(&self, node: &M) -> HierarchyResult<bool> {
        Ok(self.num_children(node)? > 0)
    }

    pub fn num_children(&self, node: &M) -> HierarchyResult<usize> {
        Ok(self.children(node)?.len())
    }

    /// Whether `node` has no children.
    pub fn is_last_level(&self, node: &M) -> HierarchyResult<bool> {
        Ok(!self.has_children(node)?)
    }

    /// Replace the cached children with `children`. Nothing is persisted.
    ///
    /// References that resolve to nothing are skipped. Fails without
    /// changing the cache if any reference resolves to `node` itself.
    pub fn set_children(&self, node: &M, children: &[NodeRef<M>]) -> HierarchyResult<()> {
        let obj_type = node.obj_type();
        let mut resolved = Vec::with_capacity(children.len());
        for reference in children {
            if let Some(child) = self.resolve(&obj_type, reference)? {
                ensure_not_self_child(node, &child)?;
                resolved.push(child);
            }
        }
        node.hierarchy().cache_children(Arc::new(resolved));
        Ok(())
    }

    /// Append a child to the cached children. Nothing is persisted.
    ///
    /// The existing children are loaded first. Returns `false` if the
    /// reference does not resolve.
    pub fn add_child(&self, node: &M, child: &NodeRef<M>) -> HierarchyResult<bool> {
        let Some(child) = self.resolve(&node.obj_type(), child)? else {
            return Ok(false);
        };
        ensure_not_self_child(node, &child)?;
        let mut children = self.children(node)?.to_vec();
        children.push(child);
        node.hierarchy().cache_children(Arc::new(children));
        Ok(true)
    }

    // ---------------------------------------------------------------
    // Siblings
    // ---------------------------------------------------------------

    /// Siblings as enumerated by the configured strategy, cached on the node.
    pub fn siblings(&self, node: &M) -> HierarchyResult<NodeList<M>> {
        if let Some(cached) = node.hierarchy().cached_siblings() {
            return Ok(cached);
        }
        let siblings = Arc::new(self.siblings.load_siblings(self, node)?);
        node.hierarchy().cache_siblings(Arc::clone(&siblings));
        Ok(siblings)
    }

    pub fn num_siblings(&self, node: &M) -> HierarchyResult<usize> {
        Ok(self.siblings(node)?.len())
    }

    /// More than one sibling, since the default strategy counts the node itself.
    pub fn has_siblings(&self, node: &M) -> HierarchyResult<bool> {
        Ok(self.num_siblings(node)? > 1)
    }

    // ---------------------------------------------------------------
    // Relationship tests
    // ---------------------------------------------------------------

    /// Whether `master` is `node`'s immediate parent.
    pub fn is_child_of(&self, node: &M, master: &NodeRef<M>) -> HierarchyResult<bool> {
        let Some(master) = self.resolve(&node.obj_type(), master)? else {
            return Ok(false);
        };
        Ok(master.id().is_some() && master.id() == node.hierarchy().master())
    }

    /// Whether `node` is `child`'s immediate parent.
    pub fn is_master_of(&self, node: &M, child: &NodeRef<M>) -> HierarchyResult<bool> {
        let Some(child) = self.resolve(&node.obj_type(), child)? else {
            return Ok(false);
        };
        Ok(node.id().is_some() && child.hierarchy().master() == node.id())
    }

    /// Whether `sibling` has the same parent reference as `node`.
    ///
    /// Two top-level nodes share the absent parent and count as siblings.
    pub fn is_sibling_of(&self, node: &M, sibling: &NodeRef<M>) -> HierarchyResult<bool> {
        let Some(sibling) = self.resolve(&node.obj_type(), sibling)? else {
            return Ok(false);
        };
        Ok(sibling.hierarchy().master() == node.hierarchy().master())
    }

    /// Whether `master` is `node`'s parent or any further ancestor.
    pub fn recursive_is_child_of(&self, node: &M, master: &NodeRef<M>) -> HierarchyResult<bool> {
        let Some(target) = self.resolve(&node.obj_type(), master)? else {
            return Ok(false);
        };
        let Some(target_id) = target.id() else {
            return Ok(false);
        };
        if node.hierarchy().master() == Some(target_id) {
            return Ok(true);
        }
        let mut seen: HashSet<ObjectId> = node.id().cloned().into_iter().collect();
        let mut current = self.parent(node)?;
        while let Some(ancestor) = current {
            if let Some(id) = ancestor.id() {
                if !seen.insert(id.clone()) {
                    return Err(HierarchyError::CycleDetected(id.clone()));
                }
            }
            if ancestor.hierarchy().master() == Some(target_id) {
                return Ok(true);
            }
            current = self.parent(&ancestor)?;
        }
        Ok(false)
    }

    /// Descendant test. Not supported.
    pub fn recursive_is_master_of(&self, _node: &M, _child: &NodeRef<M>) -> HierarchyResult<bool> {
        Err(HierarchyError::Unsupported("recursive_is_master_of"))
    }

    /// Descendant count. Not supported.
    pub fn recursive_num_children(&self, _node: &M) -> HierarchyResult<usize> {
        Err(HierarchyError::Unsupported("recursive_num_children"))
    }
}

fn ensure_not_self_child<M: HierarchicalNode>(node: &M, child: &M) -> HierarchyResult<()> {
    match (node.id(), child.id()) {
        (Some(a), Some(b)) if a == b => Err(HierarchyError::SelfChild(a.clone())),
        _ => Ok(()),
    }
}

impl<M: HierarchicalNode> Default for HierarchyEngine<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: HierarchicalNode> Clone for HierarchyEngine<M> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            factory: self.factory.clone(),
            cache: Arc::clone(&self.cache),
            siblings: Arc::clone(&self.siblings),
        }
    }
}

impl<M: HierarchicalNode> std::fmt::Debug for HierarchyEngine<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HierarchyEngine")
            .field("store", &self.store.is_some())
            .field("factory", &self.factory.is_some())
            .field("cached_nodes", &self.cache.len())
            .finish()
    }
}
