use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::engine::HierarchyEngine;
use crate::error::HierarchyResult;
use crate::node::HierarchicalNode;

/// How a node's siblings are enumerated.
pub trait SiblingsStrategy<M: HierarchicalNode>: Send + Sync {
    fn load_siblings(
        &self,
        engine: &HierarchyEngine<M>,
        node: &M,
    ) -> HierarchyResult<Vec<Arc<M>>>;
}

/// Siblings are the parent's children, the node itself included. Top-level
/// nodes have no siblings.
#[derive(Clone, Copy, Debug, Default)]
pub struct ParentChildren;

impl<M: HierarchicalNode> SiblingsStrategy<M> for ParentChildren {
    fn load_siblings(
        &self,
        engine: &HierarchyEngine<M>,
        node: &M,
    ) -> HierarchyResult<Vec<Arc<M>>> {
        match engine.parent(node)? {
            Some(parent) => Ok(engine.children(&parent)?.to_vec()),
            None => Ok(Vec::new()),
        }
    }
}

/// Siblings are the other nodes sharing this node's parent. For top-level
/// nodes that means every other top-level node of the same type.
#[derive(Clone, Copy, Debug, Default)]
pub struct StrictSiblings;

impl<M: HierarchicalNode> SiblingsStrategy<M> for StrictSiblings {
    fn load_siblings(
        &self,
        engine: &HierarchyEngine<M>,
        node: &M,
    ) -> HierarchyResult<Vec<Arc<M>>> {
        let candidates = match engine.parent(node)? {
            Some(parent) => engine.children(&parent)?.to_vec(),
            None => engine.query_top_level(node)?,
        };
        Ok(candidates
            .into_iter()
            .filter(|c| node.id().is_none() || c.id() != node.id())
            .collect())
    }
}

/// Configuration name of a built-in strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiblingMode {
    #[default]
    ParentChildren,
    Strict,
}

impl SiblingMode {
    pub fn strategy<M: HierarchicalNode>(self) -> Arc<dyn SiblingsStrategy<M>> {
        match self {
            Self::ParentChildren => Arc::new(ParentChildren),
            Self::Strict => Arc::new(StrictSiblings),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{engine_with_store, insert, load, Page};
    use cairn_types::ObjectId;

    fn ids(list: &[Arc<Page>]) -> Vec<ObjectId> {
        list.iter().filter_map(|p| p.id.clone()).collect()
    }

    #[test]
    fn parent_children_includes_self() {
        let (engine, store) = engine_with_store();
        let root = insert(&store, "root", None, 0);
        let a = insert(&store, "a", Some(&root), 0);
        let b = insert(&store, "b", Some(&root), 1);

        let node = load(&engine, &a);
        let siblings = engine.siblings(&node).unwrap();
        assert_eq!(ids(&siblings), vec![a, b]);
    }

    #[test]
    fn parent_children_top_level_is_empty() {
        let (engine, store) = engine_with_store();
        let root = insert(&store, "root", None, 0);
        insert(&store, "other", None, 1);
        let node = load(&engine, &root);
        assert!(engine.siblings(&node).unwrap().is_empty());
    }

    #[test]
    fn strict_excludes_self() {
        let (engine, store) = engine_with_store();
        let engine = engine.with_siblings_strategy(SiblingMode::Strict.strategy());
        let root = insert(&store, "root", None, 0);
        let a = insert(&store, "a", Some(&root), 0);
        let b = insert(&store, "b", Some(&root), 1);

        let node = load(&engine, &a);
        assert_eq!(ids(&engine.siblings(&node).unwrap()), vec![b]);
    }

    #[test]
    fn strict_enumerates_top_level_nodes() {
        let (engine, store) = engine_with_store();
        let engine = engine.with_siblings_strategy(Arc::new(StrictSiblings));
        let r1 = insert(&store, "r1", None, 0);
        let r2 = insert(&store, "r2", None, 1);
        insert(&store, "child", Some(&r1), 0);

        let node = load(&engine, &r1);
        assert_eq!(ids(&engine.siblings(&node).unwrap()), vec![r2]);
    }

    #[test]
    fn mode_deserializes_from_snake_case() {
        let mode: SiblingMode = serde_json::from_str("\"strict\"").unwrap();
        assert_eq!(mode, SiblingMode::Strict);
        assert_eq!(SiblingMode::default(), SiblingMode::ParentChildren);
    }
}
