use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use cairn_types::{ObjType, ObjectId, Record};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::query::Query;
use crate::traits::ObjectStore;

/// How the in-memory store assigns identities to new records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IdStrategy {
    /// Per-type integer sequence starting at 1.
    #[default]
    AutoIncrement,
    /// Time-ordered UUID v7 strings.
    Uuid,
}

#[derive(Default)]
struct Tables {
    records: HashMap<ObjType, BTreeMap<ObjectId, Record>>,
    sequences: HashMap<ObjType, i64>,
    strategies: HashMap<ObjType, IdStrategy>,
}

impl Tables {
    fn next_id(&mut self, obj_type: &ObjType) -> ObjectId {
        match self.strategies.get(obj_type).copied().unwrap_or_default() {
            IdStrategy::Uuid => ObjectId::generate(),
            IdStrategy::AutoIncrement => {
                let seq = self.sequences.entry(obj_type.clone()).or_insert(0);
                *seq += 1;
                ObjectId::Int(*seq)
            }
        }
    }

    // Explicit integer ids must not collide with later generated ones.
    fn observe_id(&mut self, obj_type: &ObjType, id: &ObjectId) {
        if let Some(n) = id.as_int() {
            let seq = self.sequences.entry(obj_type.clone()).or_insert(0);
            if n > *seq {
                *seq = n;
            }
        }
    }
}

/// In-memory, map-based record store.
///
/// Intended for tests and embedding. Records are held per type in ordered
/// maps behind a `RwLock` and cloned on read and write.
pub struct InMemoryObjectStore {
    tables: RwLock<Tables>,
}

impl InMemoryObjectStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Use `strategy` for records of `obj_type` saved without an identity.
    pub fn with_id_strategy(self, obj_type: impl Into<ObjType>, strategy: IdStrategy) -> Self {
        if let Ok(mut tables) = self.tables.write() {
            tables.strategies.insert(obj_type.into(), strategy);
        }
        self
    }

    /// Total number of records across all types.
    pub fn len(&self) -> usize {
        self.read()
            .map(|t| t.records.values().map(BTreeMap::len).sum())
            .unwrap_or(0)
    }

    /// Returns `true` if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all records. Identity sequences are kept.
    pub fn clear(&self) -> StoreResult<()> {
        self.write()?.records.clear();
        Ok(())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn load(&self, obj_type: &ObjType, id: &ObjectId) -> StoreResult<Option<Record>> {
        let tables = self.read()?;
        Ok(tables
            .records
            .get(obj_type)
            .and_then(|table| table.get(id))
            .cloned())
    }

    fn save(&self, record: &Record) -> StoreResult<ObjectId> {
        let mut tables = self.write()?;
        let id = match record.id.clone().and_then(ObjectId::normalize) {
            Some(id) => {
                tables.observe_id(&record.obj_type, &id);
                id
            }
            None => tables.next_id(&record.obj_type),
        };
        let mut stored = record.clone();
        stored.id = Some(id.clone());
        tables
            .records
            .entry(record.obj_type.clone())
            .or_default()
            .insert(id.clone(), stored);
        debug!(obj_type = %record.obj_type, id = %id, "record saved");
        Ok(id)
    }

    fn update_properties(&self, record: &Record, fields: &[&str]) -> StoreResult<bool> {
        let id = record
            .id
            .clone()
            .ok_or_else(|| StoreError::MissingId(record.obj_type.clone()))?;
        let mut tables = self.write()?;
        let Some(stored) = tables
            .records
            .get_mut(&record.obj_type)
            .and_then(|table| table.get_mut(&id))
        else {
            return Ok(false);
        };
        for field in fields {
            match record.fields.get(*field) {
                Some(value) => {
                    stored.fields.insert((*field).to_string(), value.clone());
                }
                None => {
                    stored.fields.remove(*field);
                }
            }
        }
        debug!(obj_type = %record.obj_type, id = %id, ?fields, "properties updated");
        Ok(true)
    }

    fn delete(&self, obj_type: &ObjType, id: &ObjectId) -> StoreResult<bool> {
        let mut tables = self.write()?;
        let removed = tables
            .records
            .get_mut(obj_type)
            .and_then(|table| table.remove(id))
            .is_some();
        if removed {
            debug!(obj_type = %obj_type, id = %id, "record deleted");
        }
        Ok(removed)
    }

    fn query(&self, query: &Query) -> StoreResult<Vec<Record>> {
        let tables = self.read()?;
        let Some(table) = tables.records.get(&query.obj_type) else {
            return Ok(Vec::new());
        };
        Ok(query.apply(table.values().cloned()))
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("record_count", &self.len())
            .finish()
    }
}
