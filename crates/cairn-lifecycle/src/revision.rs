//! Revision snapshots taken before each update of a revisionable object.

use cairn_store::{Direction, Model, ObjectStore, Query};
use cairn_types::{Fields, ObjType, ObjectId, Record, Timestamp, TypeError, TypeResult};
use serde_json::Value;
use tracing::debug;

use crate::diff::{diff_fields, FieldDiff};
use crate::error::LifecycleResult;

/// Type tag under which revisions are stored.
pub const REVISION_TYPE: &str = "object_revision";

// ---------------------------------------------------------------------------
// ObjectRevision
// ---------------------------------------------------------------------------

/// One immutable snapshot of an object's state around an update.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectRevision {
    pub id: Option<ObjectId>,
    pub target_type: ObjType,
    pub target_id: ObjectId,
    /// 1-based, increasing per target.
    pub rev_num: i64,
    pub rev_ts: Option<Timestamp>,
    pub rev_user: Option<String>,
    /// Stored state before the update (empty if nothing was stored).
    pub data_prev: Fields,
    /// State about to be written.
    pub data_obj: Fields,
    pub data_diff: FieldDiff,
}

impl ObjectRevision {
    /// Build the snapshot for `target` given its previously stored state.
    pub fn capture(
        target: &Record,
        target_id: ObjectId,
        previous: Option<&Record>,
        rev_num: i64,
    ) -> Self {
        let data_prev = previous.map(Record::to_flat_map).unwrap_or_default();
        let data_obj = target.to_flat_map();
        let data_diff = diff_fields(&data_prev, &data_obj);
        Self {
            id: None,
            target_type: target.obj_type.clone(),
            target_id,
            rev_num,
            rev_ts: None,
            rev_user: None,
            data_prev,
            data_obj,
            data_diff,
        }
    }

    /// The prior state as a record of the target type, ready to be saved back.
    pub fn previous_record(&self) -> Record {
        self.target_record(&self.data_prev)
    }

    /// The state written by this revision's update, as a target record.
    pub fn object_record(&self) -> Record {
        self.target_record(&self.data_obj)
    }

    fn target_record(&self, fields: &Fields) -> Record {
        let mut record = Record::new(self.target_type.clone());
        record.fields = fields.clone();
        record.remove("id");
        record.id = Some(self.target_id.clone());
        record
    }
}

fn fields_of(record: &Record, field: &str) -> TypeResult<Fields> {
    match record.get(field) {
        None => Ok(Fields::new()),
        Some(Value::Object(map)) => Ok(map.clone().into_iter().collect()),
        Some(_) => Err(TypeError::field(field, "an object")),
    }
}

fn fields_value(fields: &Fields) -> Value {
    Value::Object(fields.clone().into_iter().collect())
}

impl Model for ObjectRevision {
    fn obj_type(&self) -> ObjType {
        REVISION_TYPE.into()
    }

    fn id(&self) -> Option<&ObjectId> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: Option<ObjectId>) {
        self.id = id;
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new(REVISION_TYPE)
            .with("target_type", self.target_type.as_str())
            .with("target_id", self.target_id.to_value())
            .with("rev_num", self.rev_num)
            .with("data_prev", fields_value(&self.data_prev))
            .with("data_obj", fields_value(&self.data_obj))
            .with("data_diff", self.data_diff.to_value());
        record.id = self.id.clone();
        record.set_timestamp("rev_ts", self.rev_ts);
        record.set_opt_str("rev_user", self.rev_user.as_deref());
        record
    }

    fn from_record(record: &Record) -> TypeResult<Self> {
        let target_type = record
            .get_str("target_type")?
            .ok_or_else(|| TypeError::field("target_type", "a type tag"))?;
        let target_id = record
            .get_id("target_id")?
            .ok_or_else(|| TypeError::field("target_id", "an identifier"))?;
        let data_diff = match record.get("data_diff") {
            None => FieldDiff::default(),
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| TypeError::Serialization(e.to_string()))?,
        };
        Ok(Self {
            id: record.id.clone(),
            target_type: target_type.into(),
            target_id,
            rev_num: record.get_i64("rev_num")?.unwrap_or_default(),
            rev_ts: record.get_timestamp("rev_ts")?,
            rev_user: record.get_str("rev_user")?,
            data_prev: fields_of(record, "data_prev")?,
            data_obj: fields_of(record, "data_obj")?,
            data_diff,
        })
    }
}

// ---------------------------------------------------------------------------
// RevisionLog
// ---------------------------------------------------------------------------

/// Read and append access to the revisions of stored objects.
#[derive(Clone, Copy)]
pub struct RevisionLog<'a> {
    store: &'a dyn ObjectStore,
}

impl<'a> RevisionLog<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self { store }
    }

    fn for_target(obj_type: &ObjType, id: &ObjectId) -> Query {
        Query::new(REVISION_TYPE)
            .filter("target_type", obj_type.as_str())
            .filter("target_id", id.to_value())
    }

    fn decode(records: Vec<Record>) -> LifecycleResult<Vec<ObjectRevision>> {
        records
            .iter()
            .map(|r| ObjectRevision::from_record(r).map_err(Into::into))
            .collect()
    }

    /// Every revision of a target, oldest first.
    pub fn list(
        &self,
        obj_type: &ObjType,
        id: &ObjectId,
    ) -> LifecycleResult<Vec<ObjectRevision>> {
        let query = Self::for_target(obj_type, id).order_by("rev_num", Direction::Asc);
        Self::decode(self.store.query(&query)?)
    }

    /// The most recent revision of a target.
    pub fn latest(
        &self,
        obj_type: &ObjType,
        id: &ObjectId,
    ) -> LifecycleResult<Option<ObjectRevision>> {
        let query = Self::for_target(obj_type, id)
            .order_by("rev_num", Direction::Desc)
            .page(1, 1);
        Ok(Self::decode(self.store.query(&query)?)?.into_iter().next())
    }

    /// A specific revision by number.
    pub fn get(
        &self,
        obj_type: &ObjType,
        id: &ObjectId,
        rev_num: i64,
    ) -> LifecycleResult<Option<ObjectRevision>> {
        let query = Self::for_target(obj_type, id)
            .filter("rev_num", rev_num)
            .page(1, 1);
        Ok(Self::decode(self.store.query(&query)?)?.into_iter().next())
    }

    pub fn count(&self, obj_type: &ObjType, id: &ObjectId) -> LifecycleResult<usize> {
        Ok(self.store.count(&Self::for_target(obj_type, id))?)
    }

    /// Number the next revision of a target would get.
    pub fn next_rev_num(&self, obj_type: &ObjType, id: &ObjectId) -> LifecycleResult<i64> {
        Ok(self.latest(obj_type, id)?.map_or(1, |r| r.rev_num + 1))
    }

    /// Persist a new revision, assigning its number and identity.
    pub fn append(&self, revision: &mut ObjectRevision) -> LifecycleResult<()> {
        revision.rev_num = self.next_rev_num(&revision.target_type, &revision.target_id)?;
        let id = self.store.save(&revision.to_record())?;
        debug!(
            target_type = %revision.target_type,
            target_id = %revision.target_id,
            rev_num = revision.rev_num,
            "revision recorded"
        );
        revision.id = Some(id);
        Ok(())
    }
}

impl std::fmt::Debug for RevisionLog<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevisionLog").finish_non_exhaustive()
    }
}
