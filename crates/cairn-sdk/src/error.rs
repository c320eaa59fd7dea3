use cairn_types::{ObjType, ObjectId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CairnError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("object not found: {obj_type}:{id}")]
    NotFound { obj_type: ObjType, id: ObjectId },

    #[error("revision {rev_num} of {obj_type}:{id} not found")]
    RevisionNotFound {
        obj_type: ObjType,
        id: ObjectId,
        rev_num: i64,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid value: {0}")]
    Type(#[from] cairn_types::TypeError),

    #[error("store error: {0}")]
    Store(#[from] cairn_store::StoreError),

    #[error("hierarchy error: {0}")]
    Hierarchy(#[from] cairn_hierarchy::HierarchyError),

    #[error("lifecycle error: {0}")]
    Lifecycle(#[from] cairn_lifecycle::LifecycleError),

    #[error("route error: {0}")]
    Route(#[from] cairn_routes::RouteError),
}

pub type CairnResult<T> = Result<T, CairnError>;
