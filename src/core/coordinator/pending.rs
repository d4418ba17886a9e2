//! Pending operation records - one per in-flight remote mutation.

use crate::core::snapshot::Snapshot;
use crate::core::subscription::SubscriptionId;
use std::fmt;
use tokio::time::Instant;

/// Identifier of a pending operation, unique per coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(pub u64);

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op-{}", self.0)
    }
}

/// Which mutation an operation performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// Add a new subscription
    Create,
    /// Change fields of one subscription
    Update,
    /// Remove one subscription
    Delete,
    /// Remove several subscriptions in one batch
    BulkDelete,
}

impl MutationKind {
    /// Verb used in failure messages ("Failed to update Netflix").
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Create => "add",
            Self::Update => "update",
            Self::Delete | Self::BulkDelete => "delete",
        }
    }

    /// Past tense used in success messages ("Netflix updated").
    #[must_use]
    pub const fn past_tense(self) -> &'static str {
        match self {
            Self::Create => "added",
            Self::Update => "updated",
            Self::Delete | Self::BulkDelete => "deleted",
        }
    }

    /// Label passed to the retry policy and logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::BulkDelete => "bulk delete",
        }
    }
}

/// Lifecycle of a pending operation.
///
/// `Idle -> [Queued ->] Pending -> {Succeeded, Failed}`. `Queued` is only entered
/// while offline, including between retries (`Pending -> Queued`). Terminal
/// states accept no further transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    /// Applied locally, remote call not started
    Idle,
    /// Waiting for connectivity before the remote call
    Queued,
    /// Remote call in flight
    Pending,
    /// Remote store confirmed the change
    Succeeded,
    /// Remote store refused or retries ran out; rolled back
    Failed,
}

impl OperationStatus {
    /// True for `Succeeded` and `Failed`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Whether moving from `self` to `next` is allowed.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Queued | Self::Pending)
                | (Self::Queued, Self::Pending)
                | (Self::Pending, Self::Queued | Self::Succeeded | Self::Failed)
        )
    }
}

/// In-flight mutation bookkeeping, owned exclusively by the coordinator.
#[derive(Debug, Clone)]
pub struct PendingOperation {
    /// Operation identifier
    pub id: OperationId,
    /// What the operation does
    pub kind: MutationKind,
    /// Subscriptions the operation touches
    pub targets: Vec<SubscriptionId>,
    /// Collection captured just before the optimistic change
    pub previous: Snapshot,
    /// History revision pushed for the optimistic change
    pub revision: u64,
    /// Current lifecycle state
    pub status: OperationStatus,
    /// Deadline of the attempt in flight, refreshed on every attempt
    pub deadline: Option<Instant>,
}

impl PendingOperation {
    /// Moves to `next` if the transition is legal. Returns whether it moved.
    pub fn advance(&mut self, next: OperationStatus) -> bool {
        if self.status.can_transition_to(next) {
            self.status = next;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> PendingOperation {
        PendingOperation {
            id: OperationId(1),
            kind: MutationKind::Update,
            targets: vec!["1".into()],
            previous: Snapshot::default(),
            revision: 1,
            status: OperationStatus::Idle,
            deadline: None,
        }
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut op = record();
        assert!(op.advance(OperationStatus::Pending));
        assert!(op.advance(OperationStatus::Succeeded));
        assert!(op.status.is_terminal());
    }

    #[test]
    fn test_offline_path_goes_through_queued() {
        let mut op = record();
        assert!(op.advance(OperationStatus::Queued));
        assert!(!op.advance(OperationStatus::Succeeded));
        assert!(op.advance(OperationStatus::Pending));
        assert!(op.advance(OperationStatus::Failed));
    }

    #[test]
    fn test_connection_lost_between_retries_requeues() {
        let mut op = record();
        assert!(op.advance(OperationStatus::Pending));
        assert!(op.advance(OperationStatus::Queued));
        assert!(!op.advance(OperationStatus::Idle));
        assert!(op.advance(OperationStatus::Pending));
        assert!(op.advance(OperationStatus::Succeeded));
    }

    #[test]
    fn test_terminal_states_are_final() {
        for terminal in [OperationStatus::Succeeded, OperationStatus::Failed] {
            for next in [
                OperationStatus::Idle,
                OperationStatus::Queued,
                OperationStatus::Pending,
                OperationStatus::Succeeded,
                OperationStatus::Failed,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(MutationKind::Create.verb(), "add");
        assert_eq!(MutationKind::BulkDelete.label(), "bulk delete");
        assert_eq!(OperationId(7).to_string(), "op-7");
    }
}
