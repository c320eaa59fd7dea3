//! High-level SDK for Cairn.
//!
//! Provides the stock content models and a single [`Cairn`] facade that
//! wires the store, model factory, object cache, clock, hierarchy engine and
//! lifecycles together from a [`CairnConfig`]. This is the main entry point
//! for applications embedding Cairn.

pub mod config;
pub mod content;
pub mod error;
pub mod repository;
pub mod user_data;

pub use config::CairnConfig;
pub use content::{Content, CONTENT_TYPE};
pub use error::{CairnError, CairnResult};
pub use repository::Cairn;
pub use user_data::{UserData, UserDataHook, USER_DATA_TYPE};

// Re-export key types
pub use cairn_hierarchy::{CachePolicy, HierarchyEngine, NodeRef, SiblingMode};
pub use cairn_lifecycle::{LifecycleOutcome, ObjectRevision};
pub use cairn_routes::{slugify, ObjectRoute};
pub use cairn_store::{InMemoryObjectStore, ObjectStore};
pub use cairn_types::{ObjType, ObjectId, Record};
