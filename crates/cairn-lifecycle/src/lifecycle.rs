use std::fmt;
use std::sync::Arc;

use cairn_store::ObjectStore;
use cairn_types::{Clock, ObjType, ObjectId, SystemClock};
use tracing::{debug, error, info_span, warn, Span};

use crate::capability::{Authorable, Revisionable, SoftDeletable, Storable, Timestampable};
use crate::chain::HookChain;
use crate::error::{LifecycleError, LifecycleResult};
use crate::hook::{HookContext, LifecycleHook, Operation};
use crate::hooks::{AuthorHook, RevisionHook, SoftDeleteHook, TimestampHook};
use crate::outcome::LifecycleOutcome;

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Runs create, update, delete and restore for one model type.
///
/// Each operation is `pre` hooks, then any writes they staged, then the
/// store call, then `post` hooks.
/// Vetoes, store rejections and post-hook failures are reported through
/// [`LifecycleOutcome`] and logged inside this lifecycle's span; only
/// validation, configuration and store errors are returned as `Err`.
pub struct Lifecycle<T: Storable> {
    service: String,
    store: Option<Arc<dyn ObjectStore>>,
    clock: Arc<dyn Clock>,
    chain: HookChain<T>,
    soft_delete: bool,
    span: Span,
}

impl<T: Storable> Lifecycle<T> {
    pub fn builder(service: impl Into<String>) -> LifecycleBuilder<T> {
        LifecycleBuilder::new(service)
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn chain(&self) -> &HookChain<T> {
        &self.chain
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Whether `delete` takes the soft path for soft-deletable models.
    pub fn soft_delete_enabled(&self) -> bool {
        self.soft_delete
    }

    pub fn store(&self) -> LifecycleResult<&dyn ObjectStore> {
        self.store
            .as_deref()
            .ok_or(LifecycleError::NotConfigured("object store"))
    }

    /// Insert a new object and assign its identity.
    pub fn create(
        &self,
        target: &mut T,
        actor: Option<&str>,
    ) -> LifecycleResult<LifecycleOutcome> {
        let _guard = self.span.enter();
        self.run(Operation::Create, false, target, actor, |store, target| {
            let id = store.save(&target.to_record())?;
            target.set_id(Some(id));
            Ok(true)
        })
    }

    /// Persist changes to an existing object.
    ///
    /// The object must have an identity; if the store does not know it the
    /// outcome is [`LifecycleOutcome::StoreRejected`] and no hook runs.
    pub fn update(
        &self,
        target: &mut T,
        actor: Option<&str>,
    ) -> LifecycleResult<LifecycleOutcome> {
        let _guard = self.span.enter();
        let id = Self::require_id(target)?;
        let obj_type = target.obj_type();
        if !self.store()?.exists(&obj_type, &id)? {
            error!(obj_type = %obj_type, id = %id, "cannot update unknown object");
            return Ok(LifecycleOutcome::StoreRejected);
        }
        self.run(Operation::Update, false, target, actor, |store, target| {
            store.save(&target.to_record())?;
            Ok(true)
        })
    }

    /// Create when the object has no identity or the store does not know
    /// it, update otherwise.
    pub fn save(&self, target: &mut T, actor: Option<&str>) -> LifecycleResult<LifecycleOutcome> {
        let known = match target.id() {
            Some(id) => self.store()?.exists(&target.obj_type(), id)?,
            None => false,
        };
        if known {
            self.update(target, actor)
        } else {
            self.create(target, actor)
        }
    }

    /// Delete an object: soft for soft-deletable models when soft delete is
    /// enabled, physical otherwise.
    pub fn delete(
        &self,
        target: &mut T,
        actor: Option<&str>,
    ) -> LifecycleResult<LifecycleOutcome> {
        self.remove(target, actor, false)
    }

    /// Physically remove an object, bypassing soft-delete semantics.
    pub fn force_delete(
        &self,
        target: &mut T,
        actor: Option<&str>,
    ) -> LifecycleResult<LifecycleOutcome> {
        self.remove(target, actor, true)
    }

    /// Bring a trashed object back by clearing its soft-delete markers.
    pub fn restore(
        &self,
        target: &mut T,
        actor: Option<&str>,
    ) -> LifecycleResult<LifecycleOutcome> {
        let _guard = self.span.enter();
        let Some(fields) = self.soft_fields(target) else {
            return Err(LifecycleError::NotSoftDeletable(target.obj_type()));
        };
        Self::require_id(target)?;
        self.run(Operation::Restore, false, target, actor, |store, target| {
            Ok(store.update_properties(&target.to_record(), fields)?)
        })
    }

    fn remove(
        &self,
        target: &mut T,
        actor: Option<&str>,
        force: bool,
    ) -> LifecycleResult<LifecycleOutcome> {
        let _guard = self.span.enter();
        let id = Self::require_id(target)?;
        let soft = if force { None } else { self.soft_fields(target) };
        self.run(Operation::Delete, force, target, actor, |store, target| {
            Ok(match soft {
                Some(fields) => store.update_properties(&target.to_record(), fields)?,
                None => store.delete(&target.obj_type(), &id)?,
            })
        })
    }

    fn soft_fields(&self, target: &T) -> Option<&'static [&'static str]> {
        if !self.soft_delete {
            return None;
        }
        target.soft_deletable().map(|s| s.soft_delete_fields())
    }

    fn require_id(target: &T) -> LifecycleResult<ObjectId> {
        target
            .id()
            .cloned()
            .ok_or_else(|| LifecycleError::MissingId(target.obj_type()))
    }

    fn run<F>(
        &self,
        operation: Operation,
        force: bool,
        target: &mut T,
        actor: Option<&str>,
        execute: F,
    ) -> LifecycleResult<LifecycleOutcome>
    where
        F: FnOnce(&dyn ObjectStore, &mut T) -> LifecycleResult<bool>,
    {
        let store = self.store()?;
        let ctx = HookContext::new(operation, self.clock.as_ref(), store)
            .with_force(force)
            .with_actor(actor);
        let obj_type: ObjType = target.obj_type();

        if let Some(veto) = self.chain.run_pre(target, &ctx)? {
            ctx.discard_staged();
            error!(
                obj_type = %obj_type,
                id = ?target.id(),
                operation = %operation,
                hook = %veto.hook,
                reason = %veto.reason,
                "operation vetoed"
            );
            return Ok(LifecycleOutcome::Vetoed {
                hook: veto.hook,
                reason: veto.reason,
            });
        }

        ctx.flush_staged()?;
        if !execute(store, target)? {
            error!(
                obj_type = %obj_type,
                id = ?target.id(),
                operation = %operation,
                "store rejected operation"
            );
            return Ok(LifecycleOutcome::StoreRejected);
        }

        let id = target.id().cloned();
        let failures = self.chain.run_post(target, &ctx);
        if failures.is_empty() {
            debug!(obj_type = %obj_type, id = ?id, operation = %operation, "operation completed");
            return Ok(LifecycleOutcome::Completed { id });
        }
        for failure in &failures {
            warn!(
                obj_type = %obj_type,
                id = ?id,
                operation = %operation,
                hook = %failure.hook,
                reason = %failure.reason,
                "post hook failed"
            );
        }
        Ok(LifecycleOutcome::PartialFailure { id, failures })
    }
}

impl<T: Storable> fmt::Debug for Lifecycle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("service", &self.service)
            .field("has_store", &self.store.is_some())
            .field("hooks", &self.chain)
            .field("soft_delete", &self.soft_delete)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// LifecycleBuilder
// ---------------------------------------------------------------------------

/// Assembles a [`Lifecycle`]. Hooks run in the order they are added.
pub struct LifecycleBuilder<T: Storable> {
    service: String,
    store: Option<Arc<dyn ObjectStore>>,
    clock: Arc<dyn Clock>,
    chain: HookChain<T>,
    soft_delete: bool,
    span: Option<Span>,
}

impl<T: Storable> LifecycleBuilder<T> {
    /// `service` names the owner in logs.
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            store: None,
            clock: Arc::new(SystemClock),
            chain: HookChain::new(),
            soft_delete: false,
            span: None,
        }
    }

    pub fn store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Span every lifecycle event is emitted in.
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn hook(mut self, hook: impl LifecycleHook<T> + 'static) -> Self {
        self.chain.push(Box::new(hook));
        self
    }

    pub fn timestamps(self) -> Self
    where
        T: Timestampable,
    {
        self.hook(TimestampHook)
    }

    pub fn authorship(self) -> Self
    where
        T: Authorable,
    {
        self.hook(AuthorHook)
    }

    pub fn revisions(self) -> Self
    where
        T: Revisionable,
    {
        self.hook(RevisionHook)
    }

    /// Route `delete` through the soft path and register the marker hook.
    pub fn soft_delete(mut self) -> Self
    where
        T: SoftDeletable,
    {
        self.soft_delete = true;
        self.hook(SoftDeleteHook)
    }

    pub fn build(self) -> Lifecycle<T> {
        let span = self
            .span
            .unwrap_or_else(|| info_span!("lifecycle", service = %self.service));
        Lifecycle {
            service: self.service,
            store: self.store,
            clock: self.clock,
            chain: self.chain,
            soft_delete: self.soft_delete,
            span,
        }
    }
}

impl<T: Storable> fmt::Debug for LifecycleBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleBuilder")
            .field("service", &self.service)
            .field("hooks", &self.chain)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::HookDecision;
    use crate::revision::RevisionLog;
    use crate::testing::{at, Note, Tag};
    use cairn_store::{InMemoryObjectStore, Model};
    use cairn_types::FixedClock;
    use chrono::Duration;
    use serde_json::Value;

    struct Fixture {
        store: Arc<InMemoryObjectStore>,
        clock: Arc<FixedClock>,
        notes: Lifecycle<Note>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryObjectStore::new());
        let clock = Arc::new(FixedClock::new(at(0)));
        let notes: Lifecycle<Note> = LifecycleBuilder::new("notes")
            .store(store.clone())
            .clock(clock.clone())
            .revisions()
            .timestamps()
            .authorship()
            .soft_delete()
            .build();
        Fixture {
            store,
            clock,
            notes,
        }
    }

    fn stored(fx: &Fixture, id: &ObjectId) -> Option<Note> {
        fx.store
            .load(&"note".into(), id)
            .unwrap()
            .map(|r| Note::from_record(&r).unwrap())
    }

    fn created(fx: &Fixture, body: &str) -> Note {
        let mut note = Note::new(body);
        assert!(fx.notes.create(&mut note, Some("ann")).unwrap().is_success());
        note
    }

    struct Lock;

    impl LifecycleHook<Note> for Lock {
        fn name(&self) -> &str {
            "lock"
        }

        fn pre(&self, _: &mut Note, ctx: &HookContext<'_>) -> LifecycleResult<HookDecision> {
            if ctx.operation == Operation::Update {
                return Ok(HookDecision::veto("read only"));
            }
            Ok(HookDecision::Proceed)
        }
    }

    struct Notify;

    impl LifecycleHook<Note> for Notify {
        fn name(&self) -> &str {
            "notify"
        }

        fn post(&self, _: &Note, _: &HookContext<'_>) -> LifecycleResult<HookDecision> {
            Err(LifecycleError::hook("notify", "mailer offline"))
        }
    }

    // -----------------------------------------------------------------------
    // Create / update / save
    // -----------------------------------------------------------------------

    #[test]
    fn hooks_run_in_registration_order() {
        let fx = fixture();
        assert_eq!(
            fx.notes.chain().names(),
            vec!["revisions", "timestamps", "authorship", "soft_delete"]
        );
    }

    #[test]
    fn create_assigns_identity_and_stamps() {
        let fx = fixture();
        let note = created(&fx, "hello");

        let id = note.id.clone().unwrap();
        let saved = stored(&fx, &id).unwrap();
        assert_eq!(saved.created, Some(at(0)));
        assert_eq!(saved.last_modified, Some(at(0)));
        assert_eq!(saved.created_by.as_deref(), Some("ann"));
        assert_eq!(saved.last_modified_by.as_deref(), Some("ann"));
    }

    #[test]
    fn update_keeps_created_and_refreshes_last_modified() {
        let fx = fixture();
        let mut note = created(&fx, "v1");

        fx.clock.advance(Duration::seconds(30));
        note.body = "v2".into();
        let outcome = fx.notes.update(&mut note, Some("bob")).unwrap();
        assert!(outcome.is_success());

        let saved = stored(&fx, note.id.as_ref().unwrap()).unwrap();
        assert_eq!(saved.body, "v2");
        assert_eq!(saved.created, Some(at(0)));
        assert_eq!(saved.last_modified, Some(at(30)));
        assert_eq!(saved.created_by.as_deref(), Some("ann"));
        assert_eq!(saved.last_modified_by.as_deref(), Some("bob"));
    }

    #[test]
    fn each_update_records_one_revision() {
        let fx = fixture();
        let mut note = created(&fx, "v1");
        let id = note.id.clone().unwrap();
        let log = RevisionLog::new(fx.store.as_ref());
        assert_eq!(log.count(&note.obj_type(), &id).unwrap(), 0);

        for body in ["v2", "v3"] {
            note.body = body.into();
            fx.notes.update(&mut note, None).unwrap();
        }

        let revisions = log.list(&note.obj_type(), &id).unwrap();
        assert_eq!(revisions.len(), 2);
        assert_eq!(revisions[1].rev_num, 2);
        assert_eq!(revisions[1].data_prev.get("body"), Some(&Value::from("v2")));
        assert_eq!(revisions[1].data_obj.get("body"), Some(&Value::from("v3")));
    }

    #[test]
    fn last_modified_never_goes_backwards_under_frozen_clock() {
        let fx = fixture();
        let mut note = created(&fx, "v1");
        let first = note.last_modified;
        fx.notes.update(&mut note, None).unwrap();
        assert!(note.last_modified >= first);
    }

    #[test]
    fn update_without_identity_is_an_error() {
        let fx = fixture();
        let mut note = Note::new("x");
        let err = fx.notes.update(&mut note, None).unwrap_err();
        assert!(matches!(err, LifecycleError::MissingId(_)));
    }

    #[test]
    fn update_of_unknown_object_is_rejected_without_revision() {
        let fx = fixture();
        let mut note = Note::new("x");
        note.id = Some(ObjectId::Int(99));
        let outcome = fx.notes.update(&mut note, None).unwrap();
        assert_eq!(outcome, LifecycleOutcome::StoreRejected);
        assert!(fx.store.is_empty());
    }

    #[test]
    fn save_creates_then_updates() {
        let fx = fixture();
        let mut note = Note::new("x");
        note.id = Some(ObjectId::Int(5));
        fx.notes.save(&mut note, None).unwrap();
        assert_eq!(note.created, Some(at(0)));
        assert_eq!(fx.store.len(), 1);

        fx.clock.advance(Duration::seconds(1));
        note.body = "y".into();
        fx.notes.save(&mut note, None).unwrap();
        assert_eq!(note.created, Some(at(0)));
        assert_eq!(note.last_modified, Some(at(1)));
        // note + one revision
        assert_eq!(fx.store.len(), 2);
    }

    #[test]
    fn missing_store_is_reported_on_first_use() {
        let lifecycle: Lifecycle<Tag> = LifecycleBuilder::new("tags").build();
        let mut tag = Tag::default();
        let err = lifecycle.create(&mut tag, None).unwrap_err();
        assert!(matches!(err, LifecycleError::NotConfigured("object store")));
    }

    // -----------------------------------------------------------------------
    // Vetoes and partial failures
    // -----------------------------------------------------------------------

    #[test]
    fn veto_skips_the_store() {
        let store = Arc::new(InMemoryObjectStore::new());
        let notes: Lifecycle<Note> = LifecycleBuilder::new("notes")
            .store(store.clone())
            .hook(Lock)
            .timestamps()
            .build();
        let mut note = Note::new("v1");
        notes.create(&mut note, None).unwrap();

        note.body = "v2".into();
        let outcome = notes.update(&mut note, None).unwrap();
        assert_eq!(
            outcome,
            LifecycleOutcome::Vetoed {
                hook: "lock".into(),
                reason: "read only".into()
            }
        );
        let saved = store.load(&"note".into(), note.id.as_ref().unwrap()).unwrap();
        assert_eq!(saved.unwrap().get_str("body").unwrap().as_deref(), Some("v1"));
    }

    #[test]
    fn vetoed_update_records_no_revision() {
        let store = Arc::new(InMemoryObjectStore::new());
        let notes: Lifecycle<Note> = LifecycleBuilder::new("notes")
            .store(store.clone())
            .revisions()
            .timestamps()
            .hook(Lock)
            .build();
        let mut note = Note::new("v1");
        notes.create(&mut note, None).unwrap();
        let id = note.id.clone().unwrap();

        note.body = "v2".into();
        let outcome = notes.update(&mut note, Some("bob")).unwrap();
        assert!(matches!(outcome, LifecycleOutcome::Vetoed { .. }));

        let log = RevisionLog::new(store.as_ref());
        assert_eq!(log.count(&note.obj_type(), &id).unwrap(), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn post_failure_keeps_persisted_data() {
        let store = Arc::new(InMemoryObjectStore::new());
        let notes: Lifecycle<Note> = LifecycleBuilder::new("notes")
            .store(store.clone())
            .hook(Notify)
            .build();
        let mut note = Note::new("v1");
        let outcome = notes.create(&mut note, None).unwrap();

        assert!(outcome.is_success());
        assert_eq!(outcome.failures().len(), 1);
        assert_eq!(outcome.failures()[0].hook, "notify");
        assert!(store.exists(&"note".into(), note.id.as_ref().unwrap()).unwrap());
    }

    // -----------------------------------------------------------------------
    // Soft delete
    // -----------------------------------------------------------------------

    #[test]
    fn delete_trashes_without_removing() {
        let fx = fixture();
        let mut note = created(&fx, "x");
        let id = note.id.clone().unwrap();

        fx.clock.advance(Duration::seconds(5));
        let outcome = fx.notes.delete(&mut note, Some("mod")).unwrap();
        assert!(outcome.is_success());
        assert!(note.is_trashed());

        let saved = stored(&fx, &id).unwrap();
        assert_eq!(saved.deleted_date, Some(at(5)));
        assert_eq!(saved.deleted_by.as_deref(), Some("mod"));
        assert_eq!(saved.last_modified, Some(at(0)));
    }

    #[test]
    fn restore_clears_trash_markers() {
        let fx = fixture();
        let mut note = created(&fx, "x");
        let id = note.id.clone().unwrap();
        fx.notes.delete(&mut note, Some("mod")).unwrap();

        let outcome = fx.notes.restore(&mut note, None).unwrap();
        assert!(outcome.is_success());
        assert!(!note.is_trashed());

        let saved = stored(&fx, &id).unwrap();
        assert!(!saved.is_trashed());
        assert!(saved.deleted_by.is_none());
    }

    #[test]
    fn force_delete_removes_the_record() {
        let fx = fixture();
        let mut note = created(&fx, "x");
        let id = note.id.clone().unwrap();

        fx.notes.force_delete(&mut note, None).unwrap();
        assert!(stored(&fx, &id).is_none());
        assert!(!note.is_trashed());
    }

    #[test]
    fn delete_of_plain_model_is_physical() {
        let store = Arc::new(InMemoryObjectStore::new());
        let tags: Lifecycle<Tag> = LifecycleBuilder::new("tags").store(store.clone()).build();
        let mut tag = Tag {
            id: None,
            name: "rust".into(),
        };
        tags.create(&mut tag, None).unwrap();
        tags.delete(&mut tag, None).unwrap();
        assert!(store.is_empty());

        let err = tags.restore(&mut tag, None).unwrap_err();
        assert!(matches!(err, LifecycleError::NotSoftDeletable(_)));
    }

    #[test]
    fn delete_without_soft_delete_enabled_is_physical() {
        let store = Arc::new(InMemoryObjectStore::new());
        let notes: Lifecycle<Note> = LifecycleBuilder::new("notes").store(store.clone()).build();
        let mut note = Note::new("x");
        notes.create(&mut note, None).unwrap();
        notes.delete(&mut note, None).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn delete_of_missing_record_is_rejected() {
        let fx = fixture();
        let mut note = Note::new("x");
        note.id = Some(ObjectId::Int(42));
        let outcome = fx.notes.force_delete(&mut note, None).unwrap();
        assert_eq!(outcome, LifecycleOutcome::StoreRejected);

        let outcome = fx.notes.delete(&mut note, None).unwrap();
        assert_eq!(outcome, LifecycleOutcome::StoreRejected);
    }
}
