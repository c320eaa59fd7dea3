//! Error types for route operations.

use cairn_lifecycle::LifecycleError;
use cairn_store::StoreError;
use cairn_types::TypeError;
use thiserror::Error;

/// Errors that can occur while resolving or looking up routes.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The slug cannot be used as a path segment.
    #[error("invalid slug {slug:?}: {reason}")]
    InvalidSlug { slug: String, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Type(#[from] TypeError),
}

impl From<RouteError> for LifecycleError {
    fn from(err: RouteError) -> Self {
        match err {
            RouteError::Store(e) => LifecycleError::Store(e),
            RouteError::Type(e) => LifecycleError::Type(e),
            other => LifecycleError::hook("routes", other.to_string()),
        }
    }
}

/// Convenience type alias for route operations.
pub type RouteResult<T> = Result<T, RouteError>;
