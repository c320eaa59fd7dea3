use std::path::Path;
use std::sync::Arc;

use cairn_hierarchy::{HierarchicalNode, HierarchyEngine, ObjectCache};
use cairn_lifecycle::{Lifecycle, LifecycleBuilder, LifecycleError, LifecycleOutcome};
use cairn_lifecycle::{ObjectRevision, RevisionLog};
use cairn_routes::{slugify, ObjectRoute, RouteHook, RouteLookup};
use cairn_store::{InMemoryObjectStore, Model, ModelLoader, ObjectStore, PrototypeFactory};
use cairn_types::{Clock, ObjType, ObjectId, SystemClock};
use tracing::{debug, info};

use crate::config::CairnConfig;
use crate::content::Content;
use crate::error::{CairnError, CairnResult};
use crate::user_data::{UserData, UserDataHook};

/// High-level Cairn API.
///
/// Owns one store, one model factory, one clock and one object cache, and
/// shares them between the hierarchy engine and the lifecycles of content,
/// routes and user data.
pub struct Cairn {
    config: CairnConfig,
    store: Arc<dyn ObjectStore>,
    factory: Arc<PrototypeFactory>,
    clock: Arc<dyn Clock>,
    hierarchy: HierarchyEngine<Content>,
    content: Lifecycle<Content>,
    routes: Lifecycle<ObjectRoute>,
    user_data: Lifecycle<UserData>,
}

impl Cairn {
    /// An instance with default settings over an in-memory store.
    pub fn in_memory() -> CairnResult<Self> {
        Self::new(CairnConfig::default())
    }

    /// An instance over an in-memory store and the system clock.
    pub fn new(config: CairnConfig) -> CairnResult<Self> {
        Self::with_parts(config, Arc::new(InMemoryObjectStore::new()), Arc::new(SystemClock))
    }

    /// Load configuration from a TOML file, then build over an in-memory store.
    pub fn open(config_path: impl AsRef<Path>) -> CairnResult<Self> {
        Self::new(CairnConfig::load(config_path)?)
    }

    /// Build from explicit collaborators.
    pub fn with_parts(
        config: CairnConfig,
        store: Arc<dyn ObjectStore>,
        clock: Arc<dyn Clock>,
    ) -> CairnResult<Self> {
        let factory = Arc::new(PrototypeFactory::new());
        for obj_type in &config.content_types {
            factory.register(Content::new(obj_type.as_str()).to_record())?;
        }
        factory.register_model::<ObjectRoute>()?;
        factory.register_model::<UserData>()?;

        let hierarchy = HierarchyEngine::new()
            .with_store(Arc::clone(&store))
            .with_factory(factory.clone())
            .with_cache(config.cache.build())
            .with_siblings_strategy(config.siblings.strategy());

        let mut content: LifecycleBuilder<Content> = LifecycleBuilder::new("content")
            .store(Arc::clone(&store))
            .clock(Arc::clone(&clock));
        if config.revisions {
            content = content.revisions();
        }
        content = content.timestamps().authorship();
        if config.soft_delete {
            content = content.soft_delete();
        }

        let routes: Lifecycle<ObjectRoute> = LifecycleBuilder::new("routes")
            .store(Arc::clone(&store))
            .clock(Arc::clone(&clock))
            .hook(RouteHook)
            .build();
        let user_data: Lifecycle<UserData> = LifecycleBuilder::new("user_data")
            .store(Arc::clone(&store))
            .clock(Arc::clone(&clock))
            .hook(UserDataHook)
            .build();

        info!(
            content_types = ?config.content_types,
            revisions = config.revisions,
            soft_delete = config.soft_delete,
            "cairn initialized"
        );
        Ok(Self {
            config,
            store,
            factory,
            clock,
            hierarchy,
            content: content.build(),
            routes,
            user_data,
        })
    }

    // ---- Accessors ----

    pub fn config(&self) -> &CairnConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// The hierarchy engine for content nodes.
    pub fn hierarchy(&self) -> &HierarchyEngine<Content> {
        &self.hierarchy
    }

    /// Registered type tags, sorted.
    pub fn types(&self) -> Vec<ObjType> {
        self.factory.types()
    }

    /// Make `obj_type` available as a content type.
    pub fn register_content_type(&self, obj_type: impl Into<ObjType>) -> CairnResult<()> {
        let obj_type: ObjType = obj_type.into();
        debug!(obj_type = %obj_type, "registering content type");
        self.factory.register(Content::new(obj_type).to_record())?;
        Ok(())
    }

    // ---- Content ----

    /// A blank content object of a registered type.
    pub fn new_content(&self, obj_type: impl Into<ObjType>) -> CairnResult<Content> {
        let loader = self.loader();
        let prototype = loader.blank(&obj_type.into())?;
        Ok(Content::from_record(&prototype)?)
    }

    /// A fresh copy of stored content, or `None` if it does not exist.
    pub fn load_content(
        &self,
        obj_type: impl Into<ObjType>,
        id: impl Into<ObjectId>,
    ) -> CairnResult<Option<Content>> {
        let id: ObjectId = id.into();
        Ok(self.loader().load::<Content>(&obj_type.into(), Some(&id))?)
    }

    /// Like [`Cairn::load_content`], failing when nothing is stored.
    pub fn get_content(
        &self,
        obj_type: impl Into<ObjType>,
        id: impl Into<ObjectId>,
    ) -> CairnResult<Content> {
        let obj_type: ObjType = obj_type.into();
        let id: ObjectId = id.into();
        self.load_content(obj_type.clone(), id.clone())?
            .ok_or(CairnError::NotFound { obj_type, id })
    }

    /// Create or update content.
    pub fn save(
        &self,
        content: &mut Content,
        actor: Option<&str>,
    ) -> CairnResult<LifecycleOutcome> {
        let outcome = self.content.save(content, actor)?;
        self.invalidate(content, &outcome);
        Ok(outcome)
    }

    /// Trash content, or remove it when soft delete is disabled.
    pub fn delete(
        &self,
        content: &mut Content,
        actor: Option<&str>,
    ) -> CairnResult<LifecycleOutcome> {
        let outcome = self.content.delete(content, actor)?;
        self.invalidate(content, &outcome);
        Ok(outcome)
    }

    /// Remove content from the store regardless of soft-delete settings.
    pub fn force_delete(
        &self,
        content: &mut Content,
        actor: Option<&str>,
    ) -> CairnResult<LifecycleOutcome> {
        let outcome = self.content.force_delete(content, actor)?;
        self.invalidate(content, &outcome);
        Ok(outcome)
    }

    /// Bring trashed content back.
    pub fn restore(
        &self,
        content: &mut Content,
        actor: Option<&str>,
    ) -> CairnResult<LifecycleOutcome> {
        let outcome = self.content.restore(content, actor)?;
        self.invalidate(content, &outcome);
        Ok(outcome)
    }

    /// Drop the cached copy of `content` and its parent's cached children.
    fn invalidate(&self, content: &Content, outcome: &LifecycleOutcome) {
        if !outcome.is_success() {
            return;
        }
        let obj_type = content.obj_type();
        let cache = self.hierarchy.cache();
        if let Some(id) = content.id() {
            cache.remove(&obj_type, id);
        }
        if let Some(parent) = content.master().and_then(|m| cache.get(&obj_type, m)) {
            parent.hierarchy().reset_children();
        }
    }

    // ---- Revisions ----

    /// Every revision of `content`, oldest first.
    pub fn revisions(&self, content: &Content) -> CairnResult<Vec<ObjectRevision>> {
        let Some(id) = content.id() else {
            return Ok(Vec::new());
        };
        Ok(RevisionLog::new(self.store.as_ref()).list(&content.obj_type(), id)?)
    }

    /// Overwrite `content` with the state written by revision `rev_num` and
    /// save it as a new update.
    pub fn revert_to_revision(
        &self,
        content: &mut Content,
        rev_num: i64,
        actor: Option<&str>,
    ) -> CairnResult<LifecycleOutcome> {
        let obj_type = content.obj_type();
        let id = content
            .id()
            .cloned()
            .ok_or_else(|| LifecycleError::MissingId(obj_type.clone()))?;
        let revision = RevisionLog::new(self.store.as_ref())
            .get(&obj_type, &id, rev_num)?
            .ok_or_else(|| CairnError::RevisionNotFound {
                obj_type: obj_type.clone(),
                id: id.clone(),
                rev_num,
            })?;

        let mut reverted = Content::from_record(&revision.object_record())?;
        reverted.revisions = content.revisions;
        debug!(obj_type = %obj_type, id = %id, rev_num, "reverting to revision");
        *content = reverted;
        self.save(content, actor)
    }

    // ---- Routes ----

    /// Persist a new route, suffixing its slug if it is taken.
    pub fn create_route(&self, route: &mut ObjectRoute) -> CairnResult<LifecycleOutcome> {
        Ok(self.routes.create(route, None)?)
    }

    /// Create a route for `content` whose slug is derived from `text`.
    pub fn route_content(
        &self,
        content: &Content,
        text: &str,
        lang: Option<&str>,
    ) -> CairnResult<ObjectRoute> {
        let id = content
            .id()
            .cloned()
            .ok_or_else(|| LifecycleError::MissingId(content.obj_type()))?;
        let mut route = ObjectRoute::new(slugify(text), self.lang(lang))
            .pointing_at(content.obj_type(), id);
        self.create_route(&mut route)?;
        Ok(route)
    }

    /// The active route for a slug. The locale defaults to the configured one.
    pub fn route_for_slug(
        &self,
        slug: &str,
        lang: Option<&str>,
    ) -> CairnResult<Option<ObjectRoute>> {
        Ok(RouteLookup::new(self.store.as_ref()).by_slug(slug, self.lang(lang))?)
    }

    /// The most recent route pointing at `content`.
    pub fn route_for(
        &self,
        content: &Content,
        lang: Option<&str>,
    ) -> CairnResult<Option<ObjectRoute>> {
        let Some(id) = content.id() else {
            return Ok(None);
        };
        let lookup = RouteLookup::new(self.store.as_ref());
        Ok(lookup.latest_for(&content.obj_type(), id, self.lang(lang))?)
    }

    fn lang<'a>(&'a self, lang: Option<&'a str>) -> &'a str {
        lang.unwrap_or(&self.config.default_lang)
    }

    // ---- User data ----

    /// Persist an end-user submission, stamping its time.
    pub fn record_user_data(&self, data: &mut UserData) -> CairnResult<LifecycleOutcome> {
        Ok(self.user_data.create(data, None)?)
    }

    fn loader(&self) -> ModelLoader {
        ModelLoader::new(Arc::clone(&self.store), self.factory.clone())
    }
}

impl std::fmt::Debug for Cairn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cairn")
            .field("config", &self.config)
            .field("types", &self.types())
            .finish_non_exhaustive()
    }
}
