use std::fmt;

use serde::{Deserialize, Serialize};

/// Tag naming a model type (e.g. `"cms/page"`, `"object_route"`).
///
/// Type tags partition the object store and the object cache: the same
/// [`ObjectId`](crate::ObjectId) may exist under different tags.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjType(String);

impl ObjType {
    /// Create a type tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ObjType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjType({})", self.0)
    }
}

impl fmt::Display for ObjType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjType {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl From<String> for ObjType {
    fn from(tag: String) -> Self {
        Self(tag)
    }
}
