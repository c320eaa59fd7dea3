use std::sync::Arc;

use cairn_store::Model;
use cairn_types::{ObjType, ObjectId, Record};
use serde_json::Value;

use crate::error::{HierarchyError, HierarchyResult};

/// A reference to a hierarchical node.
///
/// Every engine operation that accepts "a node" normalizes its argument
/// through this type first.
#[derive(Debug)]
pub enum NodeRef<M> {
    /// Scalar identity, resolved through the cache and then the store.
    ById(ObjectId),
    /// An already loaded node, used as-is.
    ByNode(Arc<M>),
    /// A partial record; its identity is extracted and resolved.
    ByRecord(Record),
}

impl<M> Clone for NodeRef<M> {
    fn clone(&self) -> Self {
        match self {
            Self::ById(id) => Self::ById(id.clone()),
            Self::ByNode(node) => Self::ByNode(Arc::clone(node)),
            Self::ByRecord(record) => Self::ByRecord(record.clone()),
        }
    }
}

impl<M: Model> NodeRef<M> {
    /// Build a reference from dynamic input.
    ///
    /// `null` and blank scalars yield `None`. JSON objects become
    /// [`NodeRef::ByRecord`] with their `"id"` member as identity. Arrays,
    /// booleans, and non-integral numbers are rejected.
    pub fn from_value(obj_type: &ObjType, value: &Value) -> HierarchyResult<Option<Self>> {
        match value {
            Value::Null => Ok(None),
            Value::Object(map) => {
                let mut record = Record::new(obj_type.clone());
                for (field, v) in map {
                    if field == "id" {
                        record.id = scalar_id(v)?;
                    } else {
                        record.set(field.clone(), v.clone());
                    }
                }
                Ok(Some(Self::ByRecord(record)))
            }
            Value::Array(_) | Value::Bool(_) => Err(HierarchyError::InvalidReference(format!(
                "expected a scalar id or a {obj_type} record, got {value}"
            ))),
            scalar => Ok(scalar_id(scalar)?.map(Self::ById)),
        }
    }

    /// Identity named by this reference, checking the type tag.
    ///
    /// Does not touch the store. A blank identity is `None`.
    pub fn identity(&self, obj_type: &ObjType) -> HierarchyResult<Option<ObjectId>> {
        match self {
            Self::ById(id) => Ok(id.clone().normalize()),
            Self::ByNode(node) => {
                let actual = node.obj_type();
                if actual != *obj_type {
                    return Err(wrong_type(obj_type, &actual));
                }
                Ok(node.id().cloned().and_then(ObjectId::normalize))
            }
            Self::ByRecord(record) => {
                if record.obj_type != *obj_type {
                    return Err(wrong_type(obj_type, &record.obj_type));
                }
                match record.id.clone().and_then(ObjectId::normalize) {
                    Some(id) => Ok(Some(id)),
                    None => Ok(record.get_id("id")?),
                }
            }
        }
    }
}

fn scalar_id(value: &Value) -> HierarchyResult<Option<ObjectId>> {
    ObjectId::from_value(value).map_err(|e| HierarchyError::InvalidReference(e.to_string()))
}

fn wrong_type(expected: &ObjType, actual: &ObjType) -> HierarchyError {
    HierarchyError::InvalidReference(format!("expected a {expected} node, got {actual}"))
}

impl<M> From<ObjectId> for NodeRef<M> {
    fn from(id: ObjectId) -> Self {
        Self::ById(id)
    }
}

impl<M> From<&ObjectId> for NodeRef<M> {
    fn from(id: &ObjectId) -> Self {
        Self::ById(id.clone())
    }
}

impl<M> From<i64> for NodeRef<M> {
    fn from(id: i64) -> Self {
        Self::ById(ObjectId::Int(id))
    }
}

impl<M> From<Arc<M>> for NodeRef<M> {
    fn from(node: Arc<M>) -> Self {
        Self::ByNode(node)
    }
}

impl<M> From<Record> for NodeRef<M> {
    fn from(record: Record) -> Self {
        Self::ByRecord(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Page;
    use serde_json::json;

    fn page_type() -> ObjType {
        "page".into()
    }

    #[test]
    fn scalars_become_ids() {
        let r = NodeRef::<Page>::from_value(&page_type(), &json!("5")).unwrap().unwrap();
        assert_eq!(r.identity(&page_type()).unwrap(), Some(ObjectId::Int(5)));
        let blank = NodeRef::<Page>::from_value(&page_type(), &json!("")).unwrap();
        assert!(blank.is_none());
        assert!(NodeRef::<Page>::from_value(&page_type(), &Value::Null)
            .unwrap()
            .is_none());
    }

    #[test]
    fn objects_become_records() {
        let r = NodeRef::<Page>::from_value(&page_type(), &json!({"id": 9, "title": "x"}))
            .unwrap()
            .unwrap();
        assert!(matches!(r, NodeRef::ByRecord(_)));
        assert_eq!(r.identity(&page_type()).unwrap(), Some(ObjectId::Int(9)));
    }

    #[test]
    fn non_scalars_are_invalid() {
        for bad in [json!([1]), json!(true), json!(2.5), json!({"id": [1]})] {
            assert!(matches!(
                NodeRef::<Page>::from_value(&page_type(), &bad),
                Err(HierarchyError::InvalidReference(_))
            ));
        }
    }

    #[test]
    fn nodes_of_another_type_are_invalid() {
        let node = Arc::new(Page::new(1, "home", None));
        let r = NodeRef::from(node);
        assert!(r.identity(&page_type()).is_ok());
        assert!(matches!(
            r.identity(&"news".into()),
            Err(HierarchyError::InvalidReference(_))
        ));
    }

    #[test]
    fn record_identity_falls_back_to_field() {
        let record = Record::new("page").with("id", "14");
        let r = NodeRef::<Page>::from(record);
        assert_eq!(r.identity(&page_type()).unwrap(), Some(ObjectId::Int(14)));
    }
}
