//! Storage facade for Cairn.
//!
//! This crate is the narrow contract between Cairn's object semantics
//! (hierarchy, lifecycle, routing) and whatever actually persists data.
//! Nothing above this layer talks to a database directly.
//!
//! # Pieces
//!
//! - [`Model`]: typed object that converts to and from a [`Record`](cairn_types::Record)
//! - [`ObjectStore`]: load / save / update-properties / delete / query
//! - [`Query`]: equality filters, ordering, pagination
//! - [`ModelFactory`]: blank prototypes per type tag
//! - [`ModelLoader`]: factory + store, producing typed models
//! - [`InMemoryObjectStore`]: `HashMap`-based backend for tests and embedding
//!
//! # Rules
//!
//! 1. Backends never interpret fields beyond equality and ordering.
//! 2. A record without an identity is never "found".
//! 3. Backend errors are propagated; the facade performs no retries.

pub mod error;
pub mod factory;
pub mod loader;
pub mod memory;
pub mod model;
pub mod query;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use factory::{ModelFactory, PrototypeFactory};
pub use loader::ModelLoader;
pub use memory::{IdStrategy, InMemoryObjectStore};
pub use model::Model;
pub use query::{Direction, Filter, Order, Pagination, Query};
pub use traits::ObjectStore;
