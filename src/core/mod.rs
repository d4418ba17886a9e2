//! Framework-agnostic subscription logic: records, history, validation, retry, and
//! the optimistic mutation coordinator that ties them together.

/// Spending totals and renewal reminders
pub mod analytics;
/// Online/offline signal
pub mod connectivity;
/// Optimistic mutation coordinator
pub mod coordinator;
/// Bounded undo/redo timeline
pub mod history;
/// Toast notification seam
pub mod notify;
/// Retry policy for remote calls
pub mod retry;
/// Immutable collection snapshots
pub mod snapshot;
/// Subscription record types
pub mod subscription;
/// Field validation
pub mod validation;
