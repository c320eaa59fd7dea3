use cairn_types::ObjectId;

use crate::hook::HookFailure;

/// The result of a lifecycle operation that did not error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LifecycleOutcome {
    /// The store call and every post hook succeeded.
    Completed { id: Option<ObjectId> },
    /// The data was persisted but one or more post hooks failed.
    PartialFailure {
        id: Option<ObjectId>,
        failures: Vec<HookFailure>,
    },
    /// A pre hook stopped the operation; the store was not called.
    Vetoed { hook: String, reason: String },
    /// The store reported that nothing was written or removed.
    StoreRejected,
}

impl LifecycleOutcome {
    /// `true` when the data is persisted, including partial failures.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::PartialFailure { .. })
    }

    /// Identity of the affected object, for successful outcomes.
    pub fn id(&self) -> Option<&ObjectId> {
        match self {
            Self::Completed { id } | Self::PartialFailure { id, .. } => id.as_ref(),
            Self::Vetoed { .. } | Self::StoreRejected => None,
        }
    }

    /// Post-hook failures, empty unless this is a partial failure.
    pub fn failures(&self) -> &[HookFailure] {
        match self {
            Self::PartialFailure { failures, .. } => failures,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_failure_counts_as_success() {
        let outcome = LifecycleOutcome::PartialFailure {
            id: Some(ObjectId::Int(4)),
            failures: vec![HookFailure {
                hook: "notify".into(),
                reason: "offline".into(),
            }],
        };
        assert!(outcome.is_success());
        assert_eq!(outcome.id(), Some(&ObjectId::Int(4)));
        assert_eq!(outcome.failures().len(), 1);
    }

    #[test]
    fn veto_and_rejection_are_failures() {
        let vetoed = LifecycleOutcome::Vetoed {
            hook: "lock".into(),
            reason: "read only".into(),
        };
        assert!(!vetoed.is_success());
        assert!(vetoed.id().is_none());
        assert!(!LifecycleOutcome::StoreRejected.is_success());
    }
}
