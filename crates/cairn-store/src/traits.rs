use cairn_types::{ObjType, ObjectId, Record};

use crate::error::StoreResult;
use crate::query::Query;

/// Record-level persistence backend.
///
/// All implementations must satisfy these invariants:
/// - A record is addressed by `(obj_type, id)`; identities are unique per type.
/// - `save` of a record without an identity inserts it and assigns one.
/// - `save` of a record with an identity replaces the stored record.
/// - `update_properties` touches only the named fields.
/// - `query` results honor [`Query::apply`] semantics exactly.
/// - All backend errors are propagated, never silently ignored.
pub trait ObjectStore: Send + Sync {
    /// Load a record by type and identity.
    ///
    /// Returns `Ok(None)` if no such record exists.
    fn load(&self, obj_type: &ObjType, id: &ObjectId) -> StoreResult<Option<Record>>;

    /// Insert or replace a record and return its identity.
    fn save(&self, record: &Record) -> StoreResult<ObjectId>;

    /// Persist only the named fields of an existing record.
    ///
    /// Fields named in `fields` but absent from `record` are removed from the
    /// stored record. Returns `false` if the stored record does not exist.
    fn update_properties(&self, record: &Record, fields: &[&str]) -> StoreResult<bool>;

    /// Remove a record. Returns `true` if it existed.
    fn delete(&self, obj_type: &ObjType, id: &ObjectId) -> StoreResult<bool>;

    /// Run a query and return the matching records.
    fn query(&self, query: &Query) -> StoreResult<Vec<Record>>;

    /// Number of records matching the query, ignoring pagination.
    ///
    /// Default implementation runs the unpaginated query. Backends may
    /// override with a cheaper count.
    fn count(&self, query: &Query) -> StoreResult<usize> {
        Ok(self.query(&query.unpaginated())?.len())
    }

    /// Check whether a record exists.
    fn exists(&self, obj_type: &ObjType, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.load(obj_type, id)?.is_some())
    }
}
