//! Lifecycle hook chain for Cairn objects.
//!
//! Every mutating operation (create, update, delete, restore) runs as
//! `pre` hooks, then the store call, then `post` hooks. A `pre` hook can
//! veto; a failing `post` hook is reported as a partial failure while the
//! persisted data stays in place. Writes a `pre` hook stages on the
//! [`HookContext`] run only once the whole `pre` chain has proceeded.
//!
//! Behaviors are attached per model type by registering hooks on a
//! [`LifecycleBuilder`], in the order they should run:
//!
//! - [`RevisionHook`] snapshots the prior state before an update
//! - [`TimestampHook`] stamps creation and modification times
//! - [`AuthorHook`] records the acting user
//! - [`SoftDeleteHook`] stamps or clears the trash markers
//!
//! [`Lifecycle::delete`] takes the soft path (property-only update) for
//! models that expose [`SoftDeletable`] and the hard path otherwise;
//! [`Lifecycle::force_delete`] always removes the record.

pub mod capability;
pub mod chain;
pub mod diff;
pub mod error;
pub mod hook;
pub mod hooks;
pub mod lifecycle;
pub mod outcome;
pub mod revision;

#[cfg(test)]
mod testing;

pub use capability::{
    Authorable, Revisionable, SoftDeletable, Storable, Timestampable, SOFT_DELETE_FIELDS,
};
pub use chain::HookChain;
pub use diff::{diff_fields, FieldChange, FieldDiff};
pub use error::{LifecycleError, LifecycleResult};
pub use hook::{HookContext, HookDecision, HookFailure, LifecycleHook, Operation};
pub use hooks::{AuthorHook, RevisionHook, SoftDeleteHook, TimestampHook};
pub use lifecycle::{Lifecycle, LifecycleBuilder};
pub use outcome::LifecycleOutcome;
pub use revision::{ObjectRevision, RevisionLog, REVISION_TYPE};
