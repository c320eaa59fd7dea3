use cairn_store::StoreError;
use cairn_types::{ObjectId, TypeError};

/// Errors from hierarchy operations.
#[derive(Debug, thiserror::Error)]
pub enum HierarchyError {
    /// A node's parent reference resolves to the node itself.
    #[error("node {0} cannot be its own parent")]
    SelfParent(ObjectId),

    /// A node was added as its own child.
    #[error("node {0} cannot be its own child")]
    SelfChild(ObjectId),

    /// An ancestor walk revisited a node.
    #[error("cycle detected in ancestor chain at node {0}")]
    CycleDetected(ObjectId),

    /// The reference is not a scalar id, a record, or a node of the right type.
    #[error("invalid node reference: {0}")]
    InvalidReference(String),

    /// A collaborator needed for this operation was never supplied.
    #[error("hierarchy engine has no {0} configured")]
    NotConfigured(&'static str),

    /// The operation exists on the interface but has no defined semantics.
    #[error("unsupported hierarchy operation: {0}")]
    Unsupported(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Type(#[from] TypeError),
}

impl HierarchyError {
    /// Whether this error reports an illegal self-reference or cycle.
    pub fn is_cycle(&self) -> bool {
        matches!(
            self,
            Self::SelfParent(_) | Self::SelfChild(_) | Self::CycleDetected(_)
        )
    }
}

/// Result alias for hierarchy operations.
pub type HierarchyResult<T> = Result<T, HierarchyError>;
