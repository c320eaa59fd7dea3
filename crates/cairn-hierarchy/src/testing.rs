//! Shared fixtures for this crate's unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cairn_store::{
    Direction, InMemoryObjectStore, Model, ObjectStore, PrototypeFactory, Query, StoreResult,
};
use cairn_types::{ObjType, ObjectId, Record, TypeResult};
use serde_json::Value;

use crate::engine::HierarchyEngine;
use crate::node::{HierarchicalNode, Hierarchy};
use crate::reference::NodeRef;

#[derive(Debug, Default)]
pub(crate) struct Page {
    pub id: Option<ObjectId>,
    pub title: String,
    pub position: i64,
    hierarchy: Hierarchy<Page>,
}

impl Page {
    pub fn new(id: i64, title: &str, master: Option<&ObjectId>) -> Self {
        Self {
            id: ObjectId::Int(id).normalize(),
            ..Self::unsaved(title, master)
        }
    }

    pub fn unsaved(title: &str, master: Option<&ObjectId>) -> Self {
        Self {
            id: None,
            title: title.to_string(),
            position: 0,
            hierarchy: Hierarchy::new(master.cloned()),
        }
    }
}

impl Model for Page {
    fn obj_type(&self) -> ObjType {
        "page".into()
    }

    fn id(&self) -> Option<&ObjectId> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: Option<ObjectId>) {
        self.id = id;
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new("page")
            .with("title", self.title.clone())
            .with("position", self.position);
        record.id = self.id.clone();
        self.hierarchy.write_to(&mut record, "master");
        record
    }

    fn from_record(record: &Record) -> TypeResult<Self> {
        Ok(Self {
            id: record.id.clone(),
            title: record.get_str("title")?.unwrap_or_default(),
            position: record.get_i64("position")?.unwrap_or_default(),
            hierarchy: Hierarchy::from_record(record, "master")?,
        })
    }
}

impl HierarchicalNode for Page {
    fn hierarchy(&self) -> &Hierarchy<Self> {
        &self.hierarchy
    }

    fn hierarchy_mut(&mut self) -> &mut Hierarchy<Self> {
        &mut self.hierarchy
    }

    fn children_query(&self, parent: &ObjectId) -> Query {
        Query::new(self.obj_type())
            .filter(self.master_field(), parent.to_value())
            .order_by("position", Direction::Asc)
    }
}

/// Store wrapper counting facade calls.
#[derive(Default)]
pub(crate) struct CountingStore {
    inner: InMemoryObjectStore,
    loads: AtomicUsize,
    queries: AtomicUsize,
}

impl CountingStore {
    pub fn inner(&self) -> &InMemoryObjectStore {
        &self.inner
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl ObjectStore for CountingStore {
    fn load(&self, obj_type: &ObjType, id: &ObjectId) -> StoreResult<Option<Record>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.inner.load(obj_type, id)
    }

    fn save(&self, record: &Record) -> StoreResult<ObjectId> {
        self.inner.save(record)
    }

    fn update_properties(&self, record: &Record, fields: &[&str]) -> StoreResult<bool> {
        self.inner.update_properties(record, fields)
    }

    fn delete(&self, obj_type: &ObjType, id: &ObjectId) -> StoreResult<bool> {
        self.inner.delete(obj_type, id)
    }

    fn query(&self, query: &Query) -> StoreResult<Vec<Record>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.inner.query(query)
    }
}

fn factory() -> Arc<PrototypeFactory> {
    let factory = Arc::new(PrototypeFactory::new());
    factory
        .register(
            Record::new("page")
                .with("title", "")
                .with("position", 0)
                .with("master", Value::Null),
        )
        .unwrap();
    factory
}

pub(crate) fn engine_on(store: Arc<dyn ObjectStore>) -> HierarchyEngine<Page> {
    HierarchyEngine::new()
        .with_store(store)
        .with_factory(factory())
}

pub(crate) fn engine_with_store() -> (HierarchyEngine<Page>, Arc<InMemoryObjectStore>) {
    let store = Arc::new(InMemoryObjectStore::new());
    (engine_on(store.clone()), store)
}

pub(crate) fn insert(
    store: &InMemoryObjectStore,
    title: &str,
    master: Option<&ObjectId>,
    position: i64,
) -> ObjectId {
    let mut record = Record::new("page")
        .with("title", title)
        .with("position", position);
    record.set("master", master.map_or(Value::Null, ObjectId::to_value));
    store.save(&record).unwrap()
}

pub(crate) fn load(engine: &HierarchyEngine<Page>, id: &ObjectId) -> Arc<Page> {
    engine
        .resolve(&"page".into(), &NodeRef::from(id.clone()))
        .unwrap()
        .unwrap()
}
