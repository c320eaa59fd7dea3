//! Untyped records exchanged between models and storage backends.
//!
//! A [`Record`] is the storage-facing shape of a model: a type tag, an
//! optional identity, and a map of named JSON fields. Typed models convert
//! to and from records; backends never see the typed form.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{TypeError, TypeResult};
use crate::id::ObjectId;
use crate::obj_type::ObjType;
use crate::temporal::{format_timestamp, parse_stored_timestamp, Timestamp};

/// Named field values of a record.
pub type Fields = BTreeMap<String, Value>;

/// A storage-facing object: type tag, identity, and field values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Model type this record belongs to.
    pub obj_type: ObjType,
    /// Identity, if the record has been persisted (or was assigned one).
    pub id: Option<ObjectId>,
    /// Field values, keyed by property name.
    pub fields: Fields,
}

impl Record {
    /// An empty record of the given type with no identity.
    pub fn new(obj_type: impl Into<ObjType>) -> Self {
        Self {
            obj_type: obj_type.into(),
            id: None,
            fields: Fields::new(),
        }
    }

    /// Builder-style identity setter.
    pub fn with_id(mut self, id: impl Into<ObjectId>) -> Self {
        self.id = Into::<ObjectId>::into(id).normalize();
        self
    }

    /// Builder-style field setter.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Set a field value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Remove a field, returning its previous value.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    /// Raw field value. `null` values are reported as absent.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).filter(|v| !v.is_null())
    }

    /// Field value, with `"id"` mapped onto the record identity.
    pub fn value_of(&self, field: &str) -> Option<Value> {
        if field == "id" {
            return self.id.as_ref().map(ObjectId::to_value);
        }
        self.get(field).cloned()
    }

    /// String field. Non-string values are rejected.
    pub fn get_str(&self, field: &str) -> TypeResult<Option<String>> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(TypeError::field(field, "a string")),
        }
    }

    /// Boolean field. Accepts JSON booleans, `0`/`1`, and `"true"`/`"false"`.
    pub fn get_bool(&self, field: &str) -> TypeResult<Option<bool>> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(Value::Number(n)) => Ok(Some(n.as_i64().unwrap_or(0) != 0)),
            Some(Value::String(s)) => match s.trim() {
                "1" | "true" => Ok(Some(true)),
                "" | "0" | "false" => Ok(Some(false)),
                _ => Err(TypeError::field(field, "a boolean")),
            },
            Some(_) => Err(TypeError::field(field, "a boolean")),
        }
    }

    /// Integer field. Integral numbers and numeric strings are accepted.
    pub fn get_i64(&self, field: &str) -> TypeResult<Option<i64>> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_i64()
                .map(Some)
                .ok_or_else(|| TypeError::field(field, "an integer")),
            Some(Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| TypeError::field(field, "an integer")),
            Some(_) => Err(TypeError::field(field, "an integer")),
        }
    }

    /// Identity-valued field (e.g. a parent reference).
    pub fn get_id(&self, field: &str) -> TypeResult<Option<ObjectId>> {
        match self.get(field) {
            None => Ok(None),
            Some(value) => ObjectId::from_value(value),
        }
    }

    /// Timestamp field. Accepts the text forms of [`parse_stored_timestamp`].
    pub fn get_timestamp(&self, field: &str) -> TypeResult<Option<Timestamp>> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => parse_stored_timestamp(s).map(Some),
            Some(_) => Err(TypeError::field(field, "a timestamp")),
        }
    }

    /// Store an optional timestamp; `None` is written as `null`.
    pub fn set_timestamp(&mut self, field: impl Into<String>, at: Option<Timestamp>) {
        let value = at.map_or(Value::Null, |t| Value::String(format_timestamp(&t)));
        self.set(field, value);
    }

    /// Store an optional string; `None` is written as `null`.
    pub fn set_opt_str(&mut self, field: impl Into<String>, value: Option<&str>) {
        let value = value.map_or(Value::Null, |s| Value::String(s.to_string()));
        self.set(field, value);
    }

    /// Field map with the identity folded in under `"id"`.
    ///
    /// Used for snapshots where the full object state is compared.
    pub fn to_flat_map(&self) -> Fields {
        let mut map = self.fields.clone();
        if let Some(id) = &self.id {
            map.insert("id".into(), id.to_value());
        }
        map
    }
}
