use cairn_types::{ObjType, ObjectId, TypeError};

/// Errors from storage facade operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found where one was required.
    #[error("object not found: {obj_type}:{id}")]
    NotFound { obj_type: ObjType, id: ObjectId },

    /// No prototype is registered for the type tag.
    #[error("unknown model type: {0}")]
    UnknownType(ObjType),

    /// The operation needs a persisted identity and the record has none.
    #[error("record of type {0} has no identity")]
    MissingId(ObjType),

    /// A field could not be converted to the typed model.
    #[error("invalid record: {0}")]
    Type(#[from] TypeError),

    /// A lock guarding backend state was poisoned.
    #[error("store lock poisoned: {0}")]
    LockPoisoned(String),

    /// The backend failed.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
