//! Shared fixtures for this crate's unit tests.

use cairn_store::Model;
use cairn_types::{ObjType, ObjectId, Record, Timestamp, TypeResult};
use chrono::{TimeZone, Utc};

use crate::capability::{Authorable, Revisionable, SoftDeletable, Storable, Timestampable};

/// A fixed instant `secs` seconds after an arbitrary epoch.
pub(crate) fn at(secs: i64) -> Timestamp {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

/// A model exposing every capability.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Note {
    pub id: Option<ObjectId>,
    pub body: String,
    pub created: Option<Timestamp>,
    pub last_modified: Option<Timestamp>,
    pub created_by: Option<String>,
    pub last_modified_by: Option<String>,
    pub deleted_date: Option<Timestamp>,
    pub deleted_by: Option<String>,
    pub revisions: bool,
}

impl Note {
    pub fn new(body: &str) -> Self {
        Self {
            id: None,
            body: body.to_string(),
            created: None,
            last_modified: None,
            created_by: None,
            last_modified_by: None,
            deleted_date: None,
            deleted_by: None,
            revisions: true,
        }
    }
}

impl Model for Note {
    fn obj_type(&self) -> ObjType {
        "note".into()
    }

    fn id(&self) -> Option<&ObjectId> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: Option<ObjectId>) {
        self.id = id;
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new("note").with("body", self.body.clone());
        record.id = self.id.clone();
        record.set_timestamp("created", self.created);
        record.set_timestamp("last_modified", self.last_modified);
        record.set_opt_str("created_by", self.created_by.as_deref());
        record.set_opt_str("last_modified_by", self.last_modified_by.as_deref());
        record.set_timestamp("deleted_date", self.deleted_date);
        record.set_opt_str("deleted_by", self.deleted_by.as_deref());
        record
    }

    fn from_record(record: &Record) -> TypeResult<Self> {
        Ok(Self {
            id: record.id.clone(),
            body: record.get_str("body")?.unwrap_or_default(),
            created: record.get_timestamp("created")?,
            last_modified: record.get_timestamp("last_modified")?,
            created_by: record.get_str("created_by")?,
            last_modified_by: record.get_str("last_modified_by")?,
            deleted_date: record.get_timestamp("deleted_date")?,
            deleted_by: record.get_str("deleted_by")?,
            revisions: true,
        })
    }
}

impl Timestampable for Note {
    fn created(&self) -> Option<Timestamp> {
        self.created
    }

    fn set_created(&mut self, at: Option<Timestamp>) {
        self.created = at;
    }

    fn last_modified(&self) -> Option<Timestamp> {
        self.last_modified
    }

    fn set_last_modified(&mut self, at: Option<Timestamp>) {
        self.last_modified = at;
    }
}

impl Authorable for Note {
    fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    fn set_created_by(&mut self, user: Option<String>) {
        self.created_by = user;
    }

    fn last_modified_by(&self) -> Option<&str> {
        self.last_modified_by.as_deref()
    }

    fn set_last_modified_by(&mut self, user: Option<String>) {
        self.last_modified_by = user;
    }
}

impl Revisionable for Note {
    fn revision_enabled(&self) -> bool {
        self.revisions
    }
}

impl SoftDeletable for Note {
    fn deleted_date(&self) -> Option<Timestamp> {
        self.deleted_date
    }

    fn set_deleted_date(&mut self, at: Option<Timestamp>) {
        self.deleted_date = at;
    }

    fn deleted_by(&self) -> Option<&str> {
        self.deleted_by.as_deref()
    }

    fn set_deleted_by(&mut self, user: Option<String>) {
        self.deleted_by = user;
    }
}

impl Storable for Note {
    fn soft_deletable(&self) -> Option<&dyn SoftDeletable> {
        Some(self)
    }
}

/// A model with no capabilities beyond storage.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Tag {
    pub id: Option<ObjectId>,
    pub name: String,
}

impl Model for Tag {
    fn obj_type(&self) -> ObjType {
        "tag".into()
    }

    fn id(&self) -> Option<&ObjectId> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: Option<ObjectId>) {
        self.id = id;
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new("tag").with("name", self.name.clone());
        record.id = self.id.clone();
        record
    }

    fn from_record(record: &Record) -> TypeResult<Self> {
        Ok(Self {
            id: record.id.clone(),
            name: record.get_str("name")?.unwrap_or_default(),
        })
    }
}

impl Storable for Tag {}
