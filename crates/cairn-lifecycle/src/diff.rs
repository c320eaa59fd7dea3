//! Field-level diff between two snapshots of an object.
//!
//! Snapshots are [`Fields`] maps. The diff detects field additions,
//! removals, and value modifications, and is stored with each revision.

use cairn_types::Fields;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The result of comparing two snapshots.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldDiff {
    pub changes: Vec<FieldChange>,
}

impl FieldDiff {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn additions(&self) -> usize {
        self.count(|c| matches!(c, FieldChange::Added { .. }))
    }

    pub fn removals(&self) -> usize {
        self.count(|c| matches!(c, FieldChange::Removed { .. }))
    }

    pub fn modifications(&self) -> usize {
        self.count(|c| matches!(c, FieldChange::Modified { .. }))
    }

    /// Names of every field touched, in change order.
    pub fn fields(&self) -> Vec<&str> {
        self.changes.iter().map(FieldChange::field).collect()
    }

    /// JSON form, the same shape serde writes.
    pub fn to_value(&self) -> Value {
        Value::Array(self.changes.iter().map(FieldChange::to_value).collect())
    }

    fn count(&self, pred: impl Fn(&FieldChange) -> bool) -> usize {
        self.changes.iter().filter(|c| pred(c)).count()
    }
}

/// A single field change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldChange {
    Added { field: String, value: Value },
    Removed { field: String, value: Value },
    Modified { field: String, old: Value, new: Value },
}

impl FieldChange {
    pub fn field(&self) -> &str {
        match self {
            Self::Added { field, .. } | Self::Removed { field, .. } => field,
            Self::Modified { field, .. } => field,
        }
    }

    /// JSON object tagged with `"kind"`, as serde writes it.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        let (kind, field) = match self {
            Self::Added { field, value } => {
                map.insert("value".into(), value.clone());
                ("added", field)
            }
            Self::Removed { field, value } => {
                map.insert("value".into(), value.clone());
                ("removed", field)
            }
            Self::Modified { field, old, new } => {
                map.insert("old".into(), old.clone());
                map.insert("new".into(), new.clone());
                ("modified", field)
            }
        };
        map.insert("kind".into(), Value::from(kind));
        map.insert("field".into(), Value::from(field.as_str()));
        Value::Object(map)
    }
}

/// Compare two snapshots.
///
/// Fields only in `new` are `Added`, fields only in `old` are `Removed`, and
/// fields in both with different values are `Modified`. A `null` value is a
/// value like any other.
pub fn diff_fields(old: &Fields, new: &Fields) -> FieldDiff {
    let mut changes = Vec::new();

    for (field, old_val) in old {
        match new.get(field) {
            Some(new_val) if new_val != old_val => changes.push(FieldChange::Modified {
                field: field.clone(),
                old: old_val.clone(),
                new: new_val.clone(),
            }),
            Some(_) => {}
            None => changes.push(FieldChange::Removed {
                field: field.clone(),
                value: old_val.clone(),
            }),
        }
    }

    for (field, new_val) in new {
        if !old.contains_key(field) {
            changes.push(FieldChange::Added {
                field: field.clone(),
                value: new_val.clone(),
            });
        }
    }

    FieldDiff { changes }
}
