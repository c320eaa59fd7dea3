use cairn_store::{Direction, Model, ObjectStore, Query};
use serde_json::Value;
use tracing::debug;

use crate::error::RouteResult;
use crate::route::{ObjectRoute, ROUTE_TYPE};

/// Makes a route's `(slug, lang)` unique among active routes.
///
/// Each check is one query for the most recently created active route with
/// the same slug and locale. A conflicting route that points at the same
/// target is adopted (its identity is copied onto the candidate) rather than
/// duplicated; any other conflict bumps a numeric suffix and retries.
#[derive(Clone, Copy)]
pub struct SlugResolver<'a> {
    store: &'a dyn ObjectStore,
}

impl<'a> SlugResolver<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self { store }
    }

    /// The active route currently holding `route`'s slug and locale, if any.
    pub fn find_conflict(&self, route: &ObjectRoute) -> RouteResult<Option<ObjectRoute>> {
        let opt = |v: &Option<String>| v.clone().map_or(Value::Null, Value::String);
        let query = Query::new(ROUTE_TYPE)
            .filter("active", true)
            .filter("slug", opt(&route.slug))
            .filter("lang", opt(&route.lang))
            .order_by("creation_date", Direction::Desc)
            .order_by("id", Direction::Desc)
            .page(1, 1);
        match self.store.query(&query)?.first() {
            Some(record) => Ok(Some(ObjectRoute::from_record(record)?)),
            None => Ok(None),
        }
    }

    /// Whether `route` may keep its current slug.
    ///
    /// When the holder of the slug points at the same target, its identity
    /// is adopted onto `route` and the slug counts as unique.
    pub fn is_slug_unique(&self, route: &mut ObjectRoute) -> RouteResult<bool> {
        let Some(existing) = self.find_conflict(route)? else {
            return Ok(true);
        };
        let Some(existing_id) = existing.id.clone() else {
            return Ok(true);
        };
        if route.id.as_ref() == Some(&existing_id) {
            return Ok(true);
        }
        if existing.same_target(route) {
            debug!(slug = %route.slug(), id = %existing_id, "adopting existing route");
            route.id = Some(existing_id);
            return Ok(true);
        }
        Ok(false)
    }

    /// Suffix `route.slug` with `-1`, `-2`, ... until it is unique.
    ///
    /// Returns the number of collisions encountered. The suffix is always
    /// applied to the slug the route started with.
    pub fn generate_unique_slug(&self, route: &mut ObjectRoute) -> RouteResult<u32> {
        let mut original: Option<String> = None;
        let mut collisions = 0u32;
        while !self.is_slug_unique(route)? {
            let base = original.get_or_insert_with(|| route.slug().to_string());
            collisions += 1;
            route.slug = Some(format!("{base}-{collisions}"));
            debug!(slug = %route.slug(), collisions, "slug collision, retrying");
        }
        Ok(collisions)
    }
}

impl std::fmt::Debug for SlugResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlugResolver").finish_non_exhaustive()
    }
}
