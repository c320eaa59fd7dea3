use cairn_store::{Direction, Model, ObjectStore, Query};
use cairn_types::{ObjType, ObjectId};

use crate::error::RouteResult;
use crate::route::{ObjectRoute, ROUTE_TYPE};

/// Read-side queries over stored routes.
#[derive(Clone, Copy)]
pub struct RouteLookup<'a> {
    store: &'a dyn ObjectStore,
}

impl<'a> RouteLookup<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self { store }
    }

    fn first(&self, query: Query) -> RouteResult<Option<ObjectRoute>> {
        let records = self.store.query(&query.page(1, 1))?;
        match records.first() {
            Some(record) => Ok(Some(ObjectRoute::from_record(record)?)),
            None => Ok(None),
        }
    }

    fn newest_first(query: Query) -> Query {
        query
            .order_by("creation_date", Direction::Desc)
            .order_by("id", Direction::Desc)
    }

    /// The active route answering to `slug` in `lang`.
    pub fn by_slug(&self, slug: &str, lang: &str) -> RouteResult<Option<ObjectRoute>> {
        let query = Query::new(ROUTE_TYPE)
            .filter("active", true)
            .filter("slug", slug)
            .filter("lang", lang);
        self.first(Self::newest_first(query))
    }

    /// The most recent active route pointing at a target in `lang`.
    pub fn latest_for(
        &self,
        obj_type: &ObjType,
        id: &ObjectId,
        lang: &str,
    ) -> RouteResult<Option<ObjectRoute>> {
        let query = Query::new(ROUTE_TYPE)
            .filter("active", true)
            .filter("route_obj_type", obj_type.as_str())
            .filter("route_obj_id", id.to_value())
            .filter("lang", lang);
        self.first(Self::newest_first(query))
    }

    /// Every route pointing at a target, active or not, newest first.
    pub fn all_for(&self, obj_type: &ObjType, id: &ObjectId) -> RouteResult<Vec<ObjectRoute>> {
        let query = Query::new(ROUTE_TYPE)
            .filter("route_obj_type", obj_type.as_str())
            .filter("route_obj_id", id.to_value());
        self.store
            .query(&Self::newest_first(query))?
            .iter()
            .map(|r| ObjectRoute::from_record(r).map_err(Into::into))
            .collect()
    }
}

impl std::fmt::Debug for RouteLookup<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteLookup").finish_non_exhaustive()
    }
}
