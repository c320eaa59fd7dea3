use cairn_store::StoreError;
use cairn_types::{ObjType, TypeError};

/// Errors from lifecycle operations.
///
/// Vetoes and post-hook failures are not errors; they are reported through
/// [`LifecycleOutcome`](crate::LifecycleOutcome).
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// A collaborator needed for this operation was never supplied.
    #[error("lifecycle has no {0} configured")]
    NotConfigured(&'static str),

    /// The operation needs a persisted identity and the object has none.
    #[error("object of type {0} has no identity")]
    MissingId(ObjType),

    /// Restore was requested for a type without soft-delete support.
    #[error("objects of type {0} cannot be restored: not soft-deletable")]
    NotSoftDeletable(ObjType),

    /// A hook failed outright (as opposed to vetoing).
    #[error("hook '{hook}' failed: {message}")]
    Hook { hook: String, message: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Type(#[from] TypeError),
}

impl LifecycleError {
    pub fn hook(hook: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Hook {
            hook: hook.into(),
            message: message.into(),
        }
    }
}

/// Result alias for lifecycle operations.
pub type LifecycleResult<T> = Result<T, LifecycleError>;
