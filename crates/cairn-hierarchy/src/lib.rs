//! Hierarchy engine for Cairn content objects.
//!
//! Nodes point at their parent ("master") by identity. The engine resolves
//! those pointers through an object cache and the storage facade, and caches
//! every derived view (parent object, ancestor chain, children, siblings) on
//! the node itself until the matching reset method is called.
//!
//! # Pieces
//!
//! - [`Hierarchy`]: per-node state embedded in each model by composition
//! - [`HierarchicalNode`]: the model-side contract (state access, children query)
//! - [`NodeRef`]: a reference to a node by id, by record, or by instance
//! - [`HierarchyEngine`]: all traversal and mutation operations
//! - [`ObjectCache`]: read-through cache keyed by (type, id)
//! - [`SiblingsStrategy`]: pluggable sibling enumeration
//!
//! # Cache invalidation
//!
//! Reassigning a parent clears the parent object and the ancestor chain. It
//! does not clear cached children or siblings; call
//! [`Hierarchy::reset_children`] and [`Hierarchy::reset_siblings`] for that.

pub mod cache;
pub mod engine;
pub mod error;
pub mod node;
pub mod reference;
pub mod siblings;

#[cfg(test)]
mod testing;

pub use cache::{BoundedObjectCache, CachePolicy, MemoryObjectCache, NullObjectCache, ObjectCache};
pub use engine::HierarchyEngine;
pub use error::{HierarchyError, HierarchyResult};
pub use node::{HierarchicalNode, Hierarchy, NodeList};
pub use reference::NodeRef;
pub use siblings::{ParentChildren, SiblingMode, SiblingsStrategy, StrictSiblings};
