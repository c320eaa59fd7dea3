use std::cell::RefCell;
use std::fmt;

use cairn_store::ObjectStore;
use cairn_types::{Clock, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::LifecycleResult;

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

/// A mutating lifecycle operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Update,
    Delete,
    Restore,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Restore => "restore",
        })
    }
}

// ---------------------------------------------------------------------------
// HookDecision
// ---------------------------------------------------------------------------

/// What a hook wants to happen next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HookDecision {
    /// Continue with the operation.
    Proceed,
    /// Stop the operation (in `pre`) or report a failure (in `post`).
    Veto { reason: String },
}

impl HookDecision {
    pub fn veto(reason: impl Into<String>) -> Self {
        Self::Veto {
            reason: reason.into(),
        }
    }

    pub fn is_proceed(&self) -> bool {
        matches!(self, Self::Proceed)
    }
}

/// A hook that vetoed or failed, with its reason.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HookFailure {
    pub hook: String,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// HookContext
// ---------------------------------------------------------------------------

/// A store write deferred until the whole `pre` chain has passed.
type StagedWrite<'a> = Box<dyn FnOnce(&dyn ObjectStore) -> LifecycleResult<()> + 'a>;

/// Everything a hook may consult while running.
pub struct HookContext<'a> {
    pub operation: Operation,
    /// Set for [`Lifecycle::force_delete`](crate::Lifecycle::force_delete).
    pub force: bool,
    pub clock: &'a dyn Clock,
    /// Identifier of the acting user, if known.
    pub actor: Option<&'a str>,
    pub store: &'a dyn ObjectStore,
    staged: RefCell<Vec<StagedWrite<'a>>>,
}

impl<'a> HookContext<'a> {
    pub fn new(operation: Operation, clock: &'a dyn Clock, store: &'a dyn ObjectStore) -> Self {
        Self {
            operation,
            force: false,
            clock,
            actor: None,
            store,
            staged: RefCell::new(Vec::new()),
        }
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_actor(mut self, actor: Option<&'a str>) -> Self {
        self.actor = actor;
        self
    }

    /// The current instant according to the context clock.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Queue a store write for after the `pre` chain.
    ///
    /// Staged writes run once every `pre` hook has proceeded and before the
    /// operation's own store call. A veto discards them.
    pub fn stage(&self, write: impl FnOnce(&dyn ObjectStore) -> LifecycleResult<()> + 'a) {
        self.staged.borrow_mut().push(Box::new(write));
    }

    /// Number of writes waiting for [`HookContext::flush_staged`].
    pub fn staged_len(&self) -> usize {
        self.staged.borrow().len()
    }

    /// Run the staged writes in the order they were queued.
    pub fn flush_staged(&self) -> LifecycleResult<()> {
        let writes = std::mem::take(&mut *self.staged.borrow_mut());
        for write in writes {
            write(self.store)?;
        }
        Ok(())
    }

    /// Drop the staged writes without running them.
    pub fn discard_staged(&self) {
        self.staged.borrow_mut().clear();
    }
}

impl fmt::Debug for HookContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookContext")
            .field("operation", &self.operation)
            .field("force", &self.force)
            .field("actor", &self.actor)
            .field("staged", &self.staged_len())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// LifecycleHook trait
// ---------------------------------------------------------------------------

/// One behavior attached to the lifecycle of `T`.
///
/// Hooks are stored as `Box<dyn LifecycleHook<T>>` and run in registration
/// order. Both stages default to [`HookDecision::Proceed`]; a hook inspects
/// `ctx.operation` to decide whether it applies.
pub trait LifecycleHook<T>: Send + Sync {
    /// Name used in logs and failure reports.
    fn name(&self) -> &str;

    /// Runs before the store call. May mutate the target or veto.
    fn pre(&self, _target: &mut T, _ctx: &HookContext<'_>) -> LifecycleResult<HookDecision> {
        Ok(HookDecision::Proceed)
    }

    /// Runs after a successful store call.
    fn post(&self, _target: &T, _ctx: &HookContext<'_>) -> LifecycleResult<HookDecision> {
        Ok(HookDecision::Proceed)
    }
}
