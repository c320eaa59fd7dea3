//! The general-purpose content model.
//!
//! [`Content`] is what most Cairn objects are: a node in a hierarchy that
//! carries timestamps, authorship, revisions and soft-delete markers, plus
//! whatever free-form fields the content type defines.

use cairn_hierarchy::{HierarchicalNode, Hierarchy};
use cairn_lifecycle::{Authorable, Revisionable, SoftDeletable, Storable, Timestampable};
use cairn_store::{Direction, Model, Query};
use cairn_types::{
    parse_timestamp, Clock, Fields, ObjType, ObjectId, Record, Timestamp, TypeError, TypeResult,
};
use serde_json::Value;

/// Default type tag for content.
pub const CONTENT_TYPE: &str = "content";

const MASTER_FIELD: &str = "master";
const PERMISSIONS_FIELD: &str = "required_acl_permissions";

/// Record fields owned by the typed part of [`Content`].
const KNOWN_FIELDS: &[&str] = &[
    "active",
    "position",
    "created",
    "last_modified",
    "created_by",
    "last_modified_by",
    "deleted_date",
    "deleted_by",
    PERMISSIONS_FIELD,
    MASTER_FIELD,
];

/// A hierarchical, revisioned, soft-deletable content object.
#[derive(Clone, Debug)]
pub struct Content {
    pub id: Option<ObjectId>,
    pub obj_type: ObjType,
    pub active: bool,
    /// Ordering among siblings. `None` sorts first.
    pub position: Option<i64>,
    pub created: Option<Timestamp>,
    pub last_modified: Option<Timestamp>,
    pub created_by: Option<String>,
    pub last_modified_by: Option<String>,
    pub deleted_date: Option<Timestamp>,
    pub deleted_by: Option<String>,
    pub required_permissions: Vec<String>,
    /// Per-instance revision switch. Not persisted.
    pub revisions: bool,
    /// Type-specific fields.
    pub data: Fields,
    hierarchy: Hierarchy<Content>,
}

impl Default for Content {
    fn default() -> Self {
        Self::new(CONTENT_TYPE)
    }
}

impl Content {
    pub fn new(obj_type: impl Into<ObjType>) -> Self {
        Self {
            id: None,
            obj_type: obj_type.into(),
            active: true,
            position: Some(0),
            created: None,
            last_modified: None,
            created_by: None,
            last_modified_by: None,
            deleted_date: None,
            deleted_by: None,
            required_permissions: Vec::new(),
            revisions: true,
            data: Fields::new(),
            hierarchy: Hierarchy::default(),
        }
    }

    /// Builder-style setter for a type-specific field.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(field.into(), value.into());
        self
    }

    /// A type-specific field. `null` reads as absent.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field).filter(|v| !v.is_null())
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(field.into(), value.into());
    }

    /// Identity of the parent node.
    pub fn master(&self) -> Option<&ObjectId> {
        self.hierarchy.master()
    }

    /// Set the position from dynamic input.
    ///
    /// `null` clears it. Integers, floats (truncated) and numeric strings
    /// are accepted; anything else is rejected.
    pub fn set_position(&mut self, value: &Value) -> TypeResult<()> {
        let invalid = || TypeError::field("position", "an integer or numeric string");
        self.position = match value {
            Value::Null => None,
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(i),
                None => Some(n.as_f64().ok_or_else(invalid)? as i64),
            },
            Value::String(s) => Some(parse_numeric(s).ok_or_else(invalid)?),
            _ => return Err(invalid()),
        };
        Ok(())
    }

    /// Set `created`, `last_modified` or `deleted_date` from text.
    ///
    /// `"now"` reads `clock`. `None` and blank text clear the field.
    pub fn set_date(
        &mut self,
        field: &str,
        input: Option<&str>,
        clock: &dyn Clock,
    ) -> TypeResult<()> {
        let slot = match field {
            "created" => &mut self.created,
            "last_modified" => &mut self.last_modified,
            "deleted_date" => &mut self.deleted_date,
            _ => return Err(TypeError::field(field, "a content date field")),
        };
        *slot = match input.map(str::trim) {
            None | Some("") => None,
            Some(text) => Some(parse_timestamp(text, clock)?),
        };
        Ok(())
    }

    /// Set the required permissions from dynamic input.
    ///
    /// Empty input (`null`, `false`, `""`, `[]`) clears the list. A string
    /// is split on commas; an array must hold only strings.
    pub fn set_required_permissions(&mut self, value: &Value) -> TypeResult<()> {
        let invalid = || TypeError::field(PERMISSIONS_FIELD, "a string or a list of strings");
        self.required_permissions = match value {
            Value::Null | Value::Bool(false) => Vec::new(),
            Value::String(s) if s.is_empty() => Vec::new(),
            Value::String(s) => s.split(',').map(|p| p.trim().to_string()).collect(),
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
                .collect::<TypeResult<_>>()?,
            _ => return Err(invalid()),
        };
        Ok(())
    }
}

fn parse_numeric(text: &str) -> Option<i64> {
    let text = text.trim();
    text.parse::<i64>()
        .ok()
        .or_else(|| text.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
}

impl Model for Content {
    fn obj_type(&self) -> ObjType {
        self.obj_type.clone()
    }

    fn id(&self) -> Option<&ObjectId> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: Option<ObjectId>) {
        self.id = id;
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new(self.obj_type.clone());
        record.fields = self.data.clone();
        record.id = self.id.clone();
        record.set("active", self.active);
        record.set("position", self.position.map_or(Value::Null, Value::from));
        record.set_timestamp("created", self.created);
        record.set_timestamp("last_modified", self.last_modified);
        record.set_opt_str("created_by", self.created_by.as_deref());
        record.set_opt_str("last_modified_by", self.last_modified_by.as_deref());
        record.set_timestamp("deleted_date", self.deleted_date);
        record.set_opt_str("deleted_by", self.deleted_by.as_deref());
        record.set(PERMISSIONS_FIELD, self.required_permissions.clone());
        self.hierarchy.write_to(&mut record, MASTER_FIELD);
        record
    }

    fn from_record(record: &Record) -> TypeResult<Self> {
        let mut content = Self::new(record.obj_type.clone());
        content.id = record.id.clone();
        content.active = record.get_bool("active")?.unwrap_or(true);
        if let Some(position) = record.fields.get("position") {
            content.set_position(position)?;
        }
        content.created = record.get_timestamp("created")?;
        content.last_modified = record.get_timestamp("last_modified")?;
        content.created_by = record.get_str("created_by")?;
        content.last_modified_by = record.get_str("last_modified_by")?;
        content.deleted_date = record.get_timestamp("deleted_date")?;
        content.deleted_by = record.get_str("deleted_by")?;
        if let Some(permissions) = record.fields.get(PERMISSIONS_FIELD) {
            content.set_required_permissions(permissions)?;
        }
        content.hierarchy = Hierarchy::from_record(record, MASTER_FIELD)?;
        content.data = record
            .fields
            .iter()
            .filter(|(field, _)| {
                let field = field.as_str();
                field != "id" && !KNOWN_FIELDS.contains(&field)
            })
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect();
        Ok(content)
    }
}

impl HierarchicalNode for Content {
    fn hierarchy(&self) -> &Hierarchy<Self> {
        &self.hierarchy
    }

    fn hierarchy_mut(&mut self) -> &mut Hierarchy<Self> {
        &mut self.hierarchy
    }

    fn master_field(&self) -> &'static str {
        MASTER_FIELD
    }

    fn children_query(&self, parent: &ObjectId) -> Query {
        Query::new(self.obj_type())
            .filter(MASTER_FIELD, parent.to_value())
            .order_by("position", Direction::Asc)
    }
}

impl Timestampable for Content {
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

impl Authorable for Content {
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

impl Revisionable for Content {
    fn revision_enabled(&self) -> bool {
        self.revisions
    }
}

impl SoftDeletable for Content {
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

impl Storable for Content {
    fn soft_deletable(&self) -> Option<&dyn SoftDeletable> {
        Some(self)
    }
}
