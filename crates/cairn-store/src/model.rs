use cairn_types::{ObjType, ObjectId, Record, TypeResult};

/// A typed object that can be persisted through an [`ObjectStore`](crate::ObjectStore).
///
/// Implementations own the mapping between their fields and a [`Record`].
/// `from_record` must accept records produced by `to_record` as well as
/// partial records (missing fields take model defaults).
pub trait Model: Sized + Send + Sync + 'static {
    /// Type tag of this instance.
    fn obj_type(&self) -> ObjType;

    /// Identity, if assigned.
    fn id(&self) -> Option<&ObjectId>;

    /// Assign (or clear) the identity.
    fn set_id(&mut self, id: Option<ObjectId>);

    /// Storage-facing form of this object.
    fn to_record(&self) -> Record;

    /// Build an instance from a storage record.
    fn from_record(record: &Record) -> TypeResult<Self>;
}
