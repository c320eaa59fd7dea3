use std::collections::HashMap;
use std::sync::RwLock;

use cairn_types::{ObjType, Record};

use crate::error::{StoreError, StoreResult};
use crate::model::Model;

/// Produces blank prototypes for model type tags.
pub trait ModelFactory: Send + Sync {
    /// A fresh record carrying the type's default field values.
    ///
    /// Fails with [`StoreError::UnknownType`] if the tag is not registered.
    fn create(&self, obj_type: &ObjType) -> StoreResult<Record>;

    /// Whether the factory knows `obj_type`.
    fn knows(&self, obj_type: &ObjType) -> bool {
        self.create(obj_type).is_ok()
    }
}

/// Factory backed by a table of registered prototype records.
#[derive(Default)]
pub struct PrototypeFactory {
    prototypes: RwLock<HashMap<ObjType, Record>>,
}

impl PrototypeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the prototype for `prototype.obj_type`.
    ///
    /// Any identity on the prototype is dropped.
    pub fn register(&self, mut prototype: Record) -> StoreResult<()> {
        prototype.id = None;
        self.prototypes
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?
            .insert(prototype.obj_type.clone(), prototype);
        Ok(())
    }

    /// Register a typed model's default instance as its prototype.
    pub fn register_model<M: Model + Default>(&self) -> StoreResult<()> {
        self.register(M::default().to_record())
    }

    /// Registered type tags, sorted.
    pub fn types(&self) -> Vec<ObjType> {
        let mut types: Vec<ObjType> = self
            .prototypes
            .read()
            .map(|p| p.keys().cloned().collect())
            .unwrap_or_default();
        types.sort();
        types
    }
}

impl ModelFactory for PrototypeFactory {
    fn create(&self, obj_type: &ObjType) -> StoreResult<Record> {
        self.prototypes
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?
            .get(obj_type)
            .cloned()
            .ok_or_else(|| StoreError::UnknownType(obj_type.clone()))
    }
}

impl std::fmt::Debug for PrototypeFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrototypeFactory")
            .field("types", &self.types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_returns_registered_prototype() {
        let factory = PrototypeFactory::new();
        factory
            .register(Record::new("page").with("active", true).with_id(3))
            .unwrap();
        let blank = factory.create(&"page".into()).unwrap();
        assert_eq!(blank.id, None);
        assert_eq!(blank.get_bool("active").unwrap(), Some(true));
        assert!(factory.knows(&"page".into()));
    }

    #[test]
    fn unknown_type_is_an_error() {
        let factory = PrototypeFactory::new();
        assert!(matches!(
            factory.create(&"ghost".into()),
            Err(StoreError::UnknownType(_))
        ));
        assert!(!factory.knows(&"ghost".into()));
    }

    #[test]
    fn types_are_sorted() {
        let factory = PrototypeFactory::new();
        factory.register(Record::new("route")).unwrap();
        factory.register(Record::new("content")).unwrap();
        let names: Vec<_> = factory.types().iter().map(|t| t.to_string()).collect();
        assert_eq!(names, vec!["content", "route"]);
    }
}
