use std::sync::Arc;

use cairn_types::{ObjType, ObjectId, Record};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::factory::ModelFactory;
use crate::model::Model;
use crate::query::Query;
use crate::traits::ObjectStore;

/// Factory plus store: turns type tags and identities into typed models.
///
/// Stored fields are merged over the type's prototype, so fields added to a
/// model after its records were written still get their defaults.
#[derive(Clone)]
pub struct ModelLoader {
    store: Arc<dyn ObjectStore>,
    factory: Arc<dyn ModelFactory>,
}

impl ModelLoader {
    pub fn new(store: Arc<dyn ObjectStore>, factory: Arc<dyn ModelFactory>) -> Self {
        Self { store, factory }
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub fn factory(&self) -> &Arc<dyn ModelFactory> {
        &self.factory
    }

    /// A blank record of `obj_type`.
    pub fn blank(&self, obj_type: &ObjType) -> StoreResult<Record> {
        self.factory.create(obj_type)
    }

    /// Load the merged record for `(obj_type, id)`.
    ///
    /// A blank identity yields `Ok(None)` without touching the store.
    pub fn load_record(
        &self,
        obj_type: &ObjType,
        id: Option<&ObjectId>,
    ) -> StoreResult<Option<Record>> {
        let Some(id) = id.cloned().and_then(ObjectId::normalize) else {
            return Ok(None);
        };
        let mut merged = self.factory.create(obj_type)?;
        let Some(stored) = self.store.load(obj_type, &id)? else {
            debug!(obj_type = %obj_type, id = %id, "record not found");
            return Ok(None);
        };
        merged.fields.extend(stored.fields);
        merged.id = stored.id;
        Ok(Some(merged))
    }

    /// Load a typed model.
    pub fn load<M: Model>(
        &self,
        obj_type: &ObjType,
        id: Option<&ObjectId>,
    ) -> StoreResult<Option<M>> {
        match self.load_record(obj_type, id)? {
            Some(record) => Ok(Some(M::from_record(&record)?)),
            None => Ok(None),
        }
    }

    /// Run a query and convert every hit into a typed model.
    pub fn query<M: Model>(&self, query: &Query) -> StoreResult<Vec<M>> {
        let prototype = self.factory.create(&query.obj_type)?;
        self.store
            .query(query)?
            .into_iter()
            .map(|stored| {
                let mut merged = prototype.clone();
                merged.fields.extend(stored.fields);
                merged.id = stored.id;
                M::from_record(&merged).map_err(StoreError::from)
            })
            .collect()
    }
}

impl std::fmt::Debug for ModelLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelLoader").finish_non_exhaustive()
    }
}
