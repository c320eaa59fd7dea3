//! Built-in hooks backing the capability traits.

use tracing::trace;

use crate::capability::{Authorable, Revisionable, SoftDeletable, Timestampable};
use crate::error::LifecycleResult;
use crate::hook::{HookContext, HookDecision, LifecycleHook, Operation};
use crate::revision::{ObjectRevision, RevisionLog};

// ---------------------------------------------------------------------------
// TimestampHook
// ---------------------------------------------------------------------------

/// Stamps `created` on create and `last_modified` on create and update.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimestampHook;

impl<T: Timestampable + Send + Sync> LifecycleHook<T> for TimestampHook {
    fn name(&self) -> &str {
        "timestamps"
    }

    fn pre(&self, target: &mut T, ctx: &HookContext<'_>) -> LifecycleResult<HookDecision> {
        match ctx.operation {
            Operation::Create => {
                let now = ctx.now();
                target.set_created(Some(now));
                target.set_last_modified(Some(now));
            }
            Operation::Update => target.set_last_modified(Some(ctx.now())),
            Operation::Delete | Operation::Restore => {}
        }
        Ok(HookDecision::Proceed)
    }
}

// ---------------------------------------------------------------------------
// AuthorHook
// ---------------------------------------------------------------------------

/// Records the acting user as creator and last modifier.
///
/// Without an actor the fields are left untouched. An explicitly assigned
/// creator is kept on create.
#[derive(Clone, Copy, Debug, Default)]
pub struct AuthorHook;

impl<T: Authorable + Send + Sync> LifecycleHook<T> for AuthorHook {
    fn name(&self) -> &str {
        "authorship"
    }

    fn pre(&self, target: &mut T, ctx: &HookContext<'_>) -> LifecycleResult<HookDecision> {
        let Some(actor) = ctx.actor else {
            return Ok(HookDecision::Proceed);
        };
        match ctx.operation {
            Operation::Create => {
                if target.created_by().is_none() {
                    target.set_created_by(Some(actor.to_string()));
                }
                target.set_last_modified_by(Some(actor.to_string()));
            }
            Operation::Update => target.set_last_modified_by(Some(actor.to_string())),
            Operation::Delete | Operation::Restore => {}
        }
        Ok(HookDecision::Proceed)
    }
}

// ---------------------------------------------------------------------------
// RevisionHook
// ---------------------------------------------------------------------------

/// Snapshots the stored state of an object right before it is updated.
///
/// The snapshot is taken during `pre` and staged on the context, so it is
/// written only if no later hook vetoes the update. Register it ahead of
/// [`TimestampHook`] so the snapshot reflects the object as the caller
/// left it.
#[derive(Clone, Copy, Debug, Default)]
pub struct RevisionHook;

impl<T: Revisionable> LifecycleHook<T> for RevisionHook {
    fn name(&self) -> &str {
        "revisions"
    }

    fn pre(&self, target: &mut T, ctx: &HookContext<'_>) -> LifecycleResult<HookDecision> {
        if ctx.operation != Operation::Update || !target.revision_enabled() {
            return Ok(HookDecision::Proceed);
        }
        let Some(id) = target.id().cloned() else {
            return Ok(HookDecision::Proceed);
        };

        let obj_type = target.obj_type();
        let previous = ctx.store.load(&obj_type, &id)?;
        let mut revision = ObjectRevision::capture(&target.to_record(), id, previous.as_ref(), 0);
        revision.rev_ts = Some(ctx.now());
        revision.rev_user = ctx.actor.map(str::to_string);

        if revision.data_diff.is_empty() {
            trace!(obj_type = %obj_type, "update changes no fields");
        }
        ctx.stage(move |store| RevisionLog::new(store).append(&mut revision));
        Ok(HookDecision::Proceed)
    }
}

// ---------------------------------------------------------------------------
// SoftDeleteHook
// ---------------------------------------------------------------------------

/// Stamps the trash markers on soft delete and clears them on restore.
#[derive(Clone, Copy, Debug, Default)]
pub struct SoftDeleteHook;

impl<T: SoftDeletable + Send + Sync> LifecycleHook<T> for SoftDeleteHook {
    fn name(&self) -> &str {
        "soft_delete"
    }

    fn pre(&self, target: &mut T, ctx: &HookContext<'_>) -> LifecycleResult<HookDecision> {
        match ctx.operation {
            Operation::Delete if !ctx.force => {
                target.set_deleted_date(Some(ctx.now()));
                target.set_deleted_by(ctx.actor.map(str::to_string));
            }
            Operation::Restore => {
                target.set_deleted_date(None);
                target.set_deleted_by(None);
            }
            _ => {}
        }
        Ok(HookDecision::Proceed)
    }
}
