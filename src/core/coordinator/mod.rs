//! Optimistic mutation coordinator.
//!
//! Every mutation follows the same path:
//!
//! 1. validate the input, failing fast before any state changes
//! 2. take the per-subscription guard (reject or queue, see [`ConflictPolicy`])
//! 3. apply the change to the local collection and push it onto the history
//! 4. send the remote call through the [`RetryPolicy`], waiting first if offline
//! 5. on failure restore the touched subscriptions from the captured snapshot
//!
//! The local collection always equals the history snapshot at the cursor, so undo and
//! redo simply move the cursor and republish. Observers receive a [`DashboardState`]
//! through [`Coordinator::subscribe`] after every change.

mod locks;
mod pending;


pub use locks::{ConflictPolicy, EntityGuard, EntityLocks};
pub use pending::{MutationKind, OperationId, OperationStatus, PendingOperation};

use super::connectivity::Connectivity;
use super::history::{DEFAULT_HISTORY_LIMIT, HistoryManager};
use super::notify::{Notifier, ToastKind};
use super::retry::RetryPolicy;
use super::snapshot::Snapshot;
use super::subscription::{Subscription, SubscriptionDraft, SubscriptionId, SubscriptionPatch};
use super::validation::{FieldError, validate_draft, validate_patch, validate_record};
use crate::errors::{Error, Result};
use crate::store::{RemoteStore, StoreError};
use chrono::Utc;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Tunables for the coordinator, loadable from the `[coordinator]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CoordinatorSettings {
    /// Maximum snapshots kept for undo/redo
    pub history_limit: usize,
    /// Behavior when a subscription already has a mutation in flight
    pub conflict_policy: ConflictPolicy,
    /// Retry and timeout settings for remote calls
    pub retry: RetryPolicy,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            conflict_policy: ConflictPolicy::default(),
            retry: RetryPolicy::default(),
        }
    }
}

/// What observers see after every change.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashboardState {
    /// Local collection, provisional while `pending` is non-empty
    pub subscriptions: Snapshot,
    /// Whether undo is available
    pub can_undo: bool,
    /// Whether redo is available
    pub can_redo: bool,
    /// Retained history entries
    pub history_size: usize,
    /// Subscriptions with an unconfirmed remote mutation
    pub pending: BTreeSet<SubscriptionId>,
    /// Last known connectivity
    pub online: bool,
}

/// One subscription a bulk delete could not remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkFailure {
    /// Identifier that stayed in place
    pub id: SubscriptionId,
    /// Display name at the time of the request
    pub name: String,
    /// Why it was not deleted
    pub reason: String,
}

/// Outcome of [`Coordinator::bulk_delete`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BulkDeleteReport {
    /// Identifiers removed locally and remotely
    pub succeeded: Vec<SubscriptionId>,
    /// Identifiers restored locally
    pub failed: Vec<BulkFailure>,
}

impl BulkDeleteReport {
    /// True when nothing failed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

struct CoordinatorState {
    collection: Snapshot,
    history: HistoryManager,
    pending: HashMap<OperationId, PendingOperation>,
}

/// Owns the local collection, its history, and every in-flight mutation.
pub struct Coordinator {
    store: Arc<dyn RemoteStore>,
    notifier: Arc<dyn Notifier>,
    settings: CoordinatorSettings,
    state: Mutex<CoordinatorState>,
    locks: EntityLocks,
    connectivity: Connectivity,
    cancel: CancellationToken,
    publisher: watch::Sender<DashboardState>,
    next_operation: AtomicU64,
}

impl Coordinator {
    /// Creates a coordinator whose collection and history start at `initial`.
    pub fn new(
        store: Arc<dyn RemoteStore>,
        notifier: Arc<dyn Notifier>,
        settings: CoordinatorSettings,
        initial: Vec<Subscription>,
    ) -> Self {
        let collection = Snapshot::new(initial);
        let history = HistoryManager::new(collection.clone(), settings.history_limit);
        let (publisher, _rx) = watch::channel(DashboardState {
            subscriptions: collection.clone(),
            history_size: history.history_size(),
            online: true,
            ..DashboardState::default()
        });

        info!(
            store = store.name(),
            records = collection.len(),
            policy = ?settings.conflict_policy,
            "coordinator ready"
        );

        Self {
            store,
            notifier,
            settings,
            state: Mutex::new(CoordinatorState {
                collection,
                history,
                pending: HashMap::new(),
            }),
            locks: EntityLocks::new(),
            connectivity: Connectivity::default(),
            cancel: CancellationToken::new(),
            publisher,
            next_operation: AtomicU64::new(1),
        }
    }

    // ---- reads ----

    /// Current local collection.
    pub fn subscriptions(&self) -> Snapshot {
        self.lock_state().collection.clone()
    }

    /// Local record for `id`, if present.
    pub fn get(&self, id: &SubscriptionId) -> Option<Subscription> {
        self.lock_state().collection.get(id).cloned()
    }

    /// Whether undo is available.
    pub fn can_undo(&self) -> bool {
        self.lock_state().history.can_undo()
    }

    /// Whether redo is available.
    pub fn can_redo(&self) -> bool {
        self.lock_state().history.can_redo()
    }

    /// Retained history entries.
    pub fn history_size(&self) -> usize {
        self.lock_state().history.history_size()
    }

    /// In-flight operations ordered by start.
    pub fn pending_operations(&self) -> Vec<PendingOperation> {
        let state = self.lock_state();
        let mut ops: Vec<PendingOperation> = state.pending.values().cloned().collect();
        ops.sort_by_key(|op| op.id);
        ops
    }

    /// True while a mutation for `id` is unconfirmed.
    pub fn is_pending(&self, id: &SubscriptionId) -> bool {
        self.lock_state()
            .pending
            .values()
            .any(|op| op.targets.contains(id))
    }

    /// Settings in use.
    pub const fn settings(&self) -> &CoordinatorSettings {
        &self.settings
    }

    /// Observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.publisher.subscribe()
    }

    /// Whether [`Coordinator::teardown`] was called.
    pub fn is_torn_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    // ---- lifecycle ----

    /// Replaces the local collection with the store's contents and restarts history.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<usize> {
        self.ensure_active()?;
        let store = Arc::clone(&self.store);
        let fetched = self
            .with_cancel(self.settings.retry.run("fetch", || store.fetch_all()))
            .await?;

        match fetched {
            Ok(records) => {
                let count = records.len();
                {
                    let mut state = self.lock_state();
                    state.collection = Snapshot::new(records);
                    let loaded = state.collection.clone();
                    state.history.reset(loaded);
                }
                self.publish();
                info!(count, "subscriptions loaded");
                Ok(count)
            }
            Err(failure) => {
                let err = Error::from_store("fetch", failure.attempts, &failure.error);
                self.notify(
                    ToastKind::Error,
                    "Failed to load subscriptions. Please try again.",
                );
                Err(err)
            }
        }
    }

    /// Stops observing in-flight calls. They resolve with [`Error::TornDown`] without
    /// rolling back or notifying, and later mutations are refused.
    pub fn teardown(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.cancel.cancel();
        let dropped = {
            let mut state = self.lock_state();
            let dropped = state.pending.len();
            state.pending.clear();
            dropped
        };
        info!(dropped, "coordinator torn down");
    }

    /// Reports a connectivity change. Transitions are announced with a toast.
    pub fn set_online(&self, online: bool) {
        if !self.connectivity.set_online(online) {
            return;
        }
        if online {
            info!("connectivity restored, flushing queued mutations");
            self.notify(ToastKind::Success, "Connection restored");
        } else {
            warn!("connectivity lost, mutations will queue");
            self.notify(
                ToastKind::Warning,
                "You're offline. Some features may be limited.",
            );
        }
        self.publish();
    }

    /// Last reported connectivity.
    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    // ---- history ----

    /// Re-applies the previous history snapshot locally. The remote store is not contacted.
    pub fn undo(&self) -> Snapshot {
        let snapshot = {
            let mut state = self.lock_state();
            let snapshot = state.history.undo();
            state.collection = snapshot.clone();
            snapshot
        };
        self.publish();
        snapshot
    }

    /// Re-applies the next history snapshot locally. The remote store is not contacted.
    pub fn redo(&self) -> Snapshot {
        let snapshot = {
            let mut state = self.lock_state();
            let snapshot = state.history.redo();
            state.collection = snapshot.clone();
            snapshot
        };
        self.publish();
        snapshot
    }

    // ---- mutations ----

    /// Adds a subscription optimistically and persists it.
    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn create(&self, draft: SubscriptionDraft) -> Result<Subscription> {
        let kind = MutationKind::Create;
        self.ensure_active()?;
        let name = draft.name.trim().to_string();

        let errors = validate_draft(&draft);
        if !errors.is_empty() {
            return Err(self.reject_invalid(kind, &name, errors));
        }

        let record = draft.into_subscription(SubscriptionId::generate(), Utc::now());
        let _guard = self.guard(kind, &record.id, &name).await?;

        let op = self.begin(kind, vec![record.id.clone()], |current| {
            Ok(current.with_inserted(record.clone()))
        })?;

        let store = Arc::clone(&self.store);
        let outcome = self.send(op, kind, || store.create(&record)).await;
        self.finish(op, kind, &name, outcome)?;
        Ok(record)
    }

    /// Applies `patch` to one subscription optimistically and persists it.
    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: &SubscriptionId, patch: SubscriptionPatch) -> Result<Subscription> {
        let kind = MutationKind::Update;
        self.ensure_active()?;
        let name = self.display_name(id);

        let errors = validate_patch(&patch);
        if !errors.is_empty() {
            return Err(self.reject_invalid(kind, &name, errors));
        }

        let _guard = self.guard(kind, id, &name).await?;

        let existing = self
            .get(id)
            .ok_or_else(|| self.reject_missing(kind, id))?;
        let updated = existing.apply_patch(&patch, Utc::now());
        let errors = validate_record(&updated);
        if !errors.is_empty() {
            return Err(self.reject_invalid(kind, &name, errors));
        }

        let op = self.begin(kind, vec![id.clone()], |current| {
            if current.contains(id) {
                Ok(current.with_replaced(updated.clone()))
            } else {
                Err(Error::SubscriptionNotFound { id: id.to_string() })
            }
        })?;

        let store = Arc::clone(&self.store);
        let outcome = self.send(op, kind, || store.update(id, &patch)).await;
        self.finish(op, kind, &name, outcome)?;
        Ok(updated)
    }

    /// Removes one subscription optimistically and deletes it remotely.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &SubscriptionId) -> Result<()> {
        let kind = MutationKind::Delete;
        self.ensure_active()?;
        let name = self.display_name(id);

        let _guard = self.guard(kind, id, &name).await?;

        let op = self.begin(kind, vec![id.clone()], |current| {
            if current.contains(id) {
                Ok(current.without(std::slice::from_ref(id)))
            } else {
                Err(Error::SubscriptionNotFound { id: id.to_string() })
            }
        });
        let op = op.map_err(|err| match err {
            Error::SubscriptionNotFound { .. } => self.reject_missing(kind, id),
            other => other,
        })?;

        let store = Arc::clone(&self.store);
        let outcome = self.send(op, kind, || store.delete(id)).await;
        self.finish(op, kind, &name, outcome)
    }

    /// Removes several subscriptions with one batch call per attempt.
    ///
    /// Each identifier settles independently: the ones the store accepted stay
    /// deleted, the ones it refused (or that were busy) are restored locally.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn bulk_delete(&self, ids: &[SubscriptionId]) -> Result<BulkDeleteReport> {
        let kind = MutationKind::BulkDelete;
        self.ensure_active()?;

        let mut seen = HashSet::new();
        let ids: Vec<SubscriptionId> = ids
            .iter()
            .filter(|id| seen.insert((*id).clone()))
            .cloned()
            .collect();
        let label = format!("{} subscriptions", ids.len());

        let errors = self.validate_bulk(&ids);
        if !errors.is_empty() {
            return Err(self.reject_invalid(kind, &label, errors));
        }

        let names: HashMap<SubscriptionId, String> = ids
            .iter()
            .map(|id| (id.clone(), self.display_name(id)))
            .collect();
        let name_of = |id: &SubscriptionId| names.get(id).cloned().unwrap_or_else(|| id.to_string());

        let mut report = BulkDeleteReport::default();
        let mut guard = self.locks.empty_guard();
        let mut order: Vec<&SubscriptionId> = ids.iter().collect();
        order.sort();
        for id in order {
            match self.settings.conflict_policy {
                ConflictPolicy::Reject => match self.locks.try_acquire(id) {
                    Some(held) => guard.absorb(held),
                    None => report.failed.push(BulkFailure {
                        id: id.clone(),
                        name: name_of(id),
                        reason: "another change is in progress".to_string(),
                    }),
                },
                ConflictPolicy::Queue => {
                    let held = self.with_cancel(self.locks.acquire(id)).await?;
                    guard.absorb(held);
                }
            }
        }
        let locked: HashSet<&SubscriptionId> = guard.ids().collect();
        // Something may have removed a queued id while we waited
        let targets: Vec<SubscriptionId> = {
            let state = self.lock_state();
            ids.iter()
                .filter(|id| locked.contains(id))
                .filter(|id| state.collection.contains(id))
                .cloned()
                .collect()
        };
        for id in ids.iter().filter(|id| locked.contains(id) && !targets.contains(id)) {
            report.failed.push(BulkFailure {
                id: id.clone(),
                name: name_of(id),
                reason: "no longer exists".to_string(),
            });
        }

        if targets.is_empty() {
            self.notify_bulk(&report);
            return Ok(report);
        }

        let op = self.begin(kind, targets.clone(), |current| Ok(current.without(&targets)))?;
        let settled = self.send_bulk(op, &targets).await;

        let (succeeded, failures) = match settled {
            Ok(settled) => settled,
            Err(Error::TornDown) => return Err(Error::TornDown),
            Err(err) => (
                Vec::new(),
                targets
                    .iter()
                    .map(|id| (id.clone(), err.to_string()))
                    .collect(),
            ),
        };

        if self.cancel.is_cancelled() {
            return Err(Error::TornDown);
        }

        let failed_ids: Vec<SubscriptionId> = failures.iter().map(|(id, _)| id.clone()).collect();
        if failed_ids.is_empty() {
            self.settle(op, OperationStatus::Succeeded);
        } else {
            self.rollback(op, &failed_ids);
        }

        report.succeeded = succeeded;
        report.failed.extend(failures.into_iter().map(|(id, reason)| BulkFailure {
            name: name_of(&id),
            id,
            reason,
        }));
        // Keep failures in request order
        report
            .failed
            .sort_by_key(|failure| ids.iter().position(|id| id == &failure.id));

        self.notify_bulk(&report);
        Ok(report)
    }

    // ---- internals ----

    fn lock_state(&self) -> MutexGuard<'_, CoordinatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_active(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(Error::TornDown)
        } else {
            Ok(())
        }
    }

    fn display_name(&self, id: &SubscriptionId) -> String {
        self.get(id).map_or_else(|| id.to_string(), |record| record.name)
    }

    fn notify(&self, kind: ToastKind, message: &str) {
        self.notifier.show_toast(kind, message);
    }

    fn publish(&self) {
        let next = {
            let state = self.lock_state();
            DashboardState {
                subscriptions: state.collection.clone(),
                can_undo: state.history.can_undo(),
                can_redo: state.history.can_redo(),
                history_size: state.history.history_size(),
                pending: state
                    .pending
                    .values()
                    .flat_map(|op| op.targets.iter().cloned())
                    .collect(),
                online: self.connectivity.is_online(),
            }
        };
        self.publisher.send_replace(next);
    }

    fn reject_invalid(&self, kind: MutationKind, name: &str, errors: Vec<FieldError>) -> Error {
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        debug!(?fields, "mutation rejected by validation");
        self.notify(
            ToastKind::Error,
            &format!("Could not {} {name}: check {}", kind.verb(), fields.join(", ")),
        );
        Error::Validation { errors }
    }

    fn reject_missing(&self, kind: MutationKind, id: &SubscriptionId) -> Error {
        self.notify(
            ToastKind::Error,
            &format!("Failed to {} {id}: subscription not found", kind.verb()),
        );
        Error::SubscriptionNotFound { id: id.to_string() }
    }

    fn validate_bulk(&self, ids: &[SubscriptionId]) -> Vec<FieldError> {
        if ids.is_empty() {
            return vec![FieldError::new("ids", "select at least one subscription")];
        }
        let state = self.lock_state();
        ids.iter()
            .filter(|id| !state.collection.contains(id))
            .map(|id| FieldError::new("ids", format!("unknown subscription {id}")))
            .collect()
    }

    /// Takes the per-subscription guard according to the conflict policy.
    async fn guard(&self, kind: MutationKind, id: &SubscriptionId, name: &str) -> Result<EntityGuard> {
        match self.settings.conflict_policy {
            ConflictPolicy::Reject => self.locks.try_acquire(id).ok_or_else(|| {
                warn!(%id, "rejecting mutation, another one is in flight");
                self.notify(
                    ToastKind::Warning,
                    &format!("Could not {} {name}: another change is in progress", kind.verb()),
                );
                Error::Conflict { id: id.to_string() }
            }),
            ConflictPolicy::Queue => {
                if self.locks.is_locked(id) {
                    debug!(%id, "queueing behind in-flight mutation");
                }
                self.with_cancel(self.locks.acquire(id)).await
            }
        }
    }

    /// Races `future` against teardown.
    async fn with_cancel<T>(&self, future: impl Future<Output = T>) -> Result<T> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(Error::TornDown),
            value = future => Ok(value),
        }
    }

    /// Applies the optimistic change and records the pending operation.
    fn begin(
        &self,
        kind: MutationKind,
        targets: Vec<SubscriptionId>,
        apply: impl FnOnce(&Snapshot) -> Result<Snapshot>,
    ) -> Result<OperationId> {
        let id = OperationId(self.next_operation.fetch_add(1, Ordering::Relaxed));
        {
            let mut state = self.lock_state();
            let previous = state.collection.clone();
            let next = apply(&previous)?;
            let revision = state.history.add_to_history(next.clone());
            state.collection = next;
            state.pending.insert(
                id,
                PendingOperation {
                    id,
                    kind,
                    targets,
                    previous,
                    revision,
                    status: OperationStatus::Idle,
                    deadline: None,
                },
            );
        }
        debug!(operation = %id, kind = kind.label(), "optimistic change applied");
        self.publish();
        Ok(id)
    }

    fn mark(&self, op: OperationId, status: OperationStatus) {
        let mut state = self.lock_state();
        if let Some(record) = state.pending.get_mut(&op) {
            if !record.advance(status) {
                warn!(operation = %op, from = ?record.status, to = ?status, "ignored illegal transition");
            }
        }
    }

    /// Marks the operation in flight and stamps the deadline of the next attempt.
    fn start_attempt(&self, op: OperationId) {
        let deadline = Instant::now() + self.settings.retry.attempt_timeout();
        let mut state = self.lock_state();
        if let Some(record) = state.pending.get_mut(&op) {
            if record.status != OperationStatus::Pending && !record.advance(OperationStatus::Pending) {
                warn!(operation = %op, from = ?record.status, "cannot start attempt");
            }
            record.deadline = Some(deadline);
        }
    }

    /// Runs before every attempt. While offline the operation is marked queued
    /// and waits for connectivity.
    async fn wait_until_online(&self, op: OperationId) -> Result<()> {
        if !self.connectivity.is_online() {
            self.mark(op, OperationStatus::Queued);
            info!(operation = %op, "offline, mutation queued");
            self.with_cancel(self.connectivity.wait_online()).await?;
            info!(operation = %op, "back online, sending queued mutation");
        }
        self.start_attempt(op);
        Ok(())
    }

    /// Sends one remote call with bounded, connectivity-aware retries.
    async fn send<T, F, Fut>(&self, op: OperationId, kind: MutationKind, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, StoreError>>,
    {
        let policy = &self.settings.retry;
        let label = kind.label();
        let mut attempt = 1;

        loop {
            self.wait_until_online(op).await?;
            match self.with_cancel(policy.attempt(label, call())).await? {
                Ok(value) => return Ok(value),
                Err(error) if policy.should_retry(&error, attempt) => {
                    let delay = policy.backoff(attempt);
                    warn!(
                        operation = %op,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "{label} failed, retrying: {}",
                        error
                    );
                    self.with_cancel(sleep(delay)).await?;
                    attempt += 1;
                }
                Err(error) => return Err(Error::from_store(label, attempt, &error)),
            }
        }
    }

    /// Runs the batch delete until every id settled or attempts ran out.
    /// Returns the deleted ids and the `(id, reason)` pairs that failed.
    async fn send_bulk(
        &self,
        op: OperationId,
        targets: &[SubscriptionId],
    ) -> Result<(Vec<SubscriptionId>, Vec<(SubscriptionId, String)>)> {
        let policy = &self.settings.retry;
        let label = MutationKind::BulkDelete.label();
        let mut remaining = targets.to_vec();
        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        let mut attempt = 1;

        loop {
            self.wait_until_online(op).await?;
            let call = policy.attempt(label, self.store.bulk_delete(&remaining));
            let result = self.with_cancel(call).await?;
            let mut retry = Vec::new();

            match result {
                Err(error) if policy.should_retry(&error, attempt) => {
                    warn!(attempt, "batch delete failed, retrying: {}", error);
                    retry = remaining.clone();
                }
                Err(error) => {
                    let reason = Error::from_store(label, attempt, &error).to_string();
                    failed.extend(remaining.drain(..).map(|id| (id, reason.clone())));
                }
                Ok(results) => {
                    let mut answered = HashSet::new();
                    for (id, outcome) in results {
                        if !remaining.contains(&id) || !answered.insert(id.clone()) {
                            continue;
                        }
                        match outcome {
                            Ok(()) => succeeded.push(id),
                            Err(error) if policy.should_retry(&error, attempt) => retry.push(id),
                            Err(error) => failed.push((id, error.to_string())),
                        }
                    }
                    for id in remaining.iter().filter(|id| !answered.contains(*id)) {
                        failed.push((id.clone(), "missing from batch response".to_string()));
                    }
                }
            }

            if retry.is_empty() {
                break;
            }
            debug!(attempt, retrying = retry.len(), "retrying part of batch delete");
            self.with_cancel(sleep(policy.backoff(attempt))).await?;
            remaining = retry;
            attempt += 1;
        }

        Ok((succeeded, failed))
    }

    /// Settles a single-entity mutation: success toast, or rollback plus error toast.
    fn finish<T>(&self, op: OperationId, kind: MutationKind, name: &str, outcome: Result<T>) -> Result<T> {
        if self.cancel.is_cancelled() {
            debug!(operation = %op, "ignoring result after teardown");
            return Err(Error::TornDown);
        }
        match outcome {
            Ok(value) => {
                self.settle(op, OperationStatus::Succeeded);
                self.notify(ToastKind::Success, &format!("{name} {}", kind.past_tense()));
                Ok(value)
            }
            Err(Error::TornDown) => Err(Error::TornDown),
            Err(err) => {
                let targets = self
                    .lock_state()
                    .pending
                    .get(&op)
                    .map(|record| record.targets.clone())
                    .unwrap_or_default();
                self.rollback(op, &targets);
                self.notify(
                    ToastKind::Error,
                    &format!("Failed to {} {name}: {}", kind.verb(), failure_reason(&err)),
                );
                Err(err)
            }
        }
    }

    fn settle(&self, op: OperationId, status: OperationStatus) {
        {
            let mut state = self.lock_state();
            if let Some(mut record) = state.pending.remove(&op) {
                record.advance(status);
                debug!(operation = %op, status = ?record.status, "operation settled");
            }
        }
        self.publish();
    }

    /// Restores `ids` from the operation's captured snapshot and keeps history in step.
    fn rollback(&self, op: OperationId, ids: &[SubscriptionId]) {
        {
            let mut state = self.lock_state();
            let Some(mut record) = state.pending.remove(&op) else {
                return;
            };
            record.advance(OperationStatus::Failed);

            let restored = state.collection.restore_entries(&record.previous, ids);
            let fully_reverted = ids.len() == record.targets.len();
            let retracted = fully_reverted && state.history.retract(record.revision);
            if !(retracted && state.history.current() == restored) {
                state.history.add_to_history(restored.clone());
            }
            state.collection = restored;

            warn!(
                operation = %op,
                kind = record.kind.label(),
                restored = ids.len(),
                retracted,
                "rolled back optimistic change"
            );
        }
        self.publish();
    }

    fn notify_bulk(&self, report: &BulkDeleteReport) {
        let deleted = report.succeeded.len();
        let total = deleted + report.failed.len();
        let failed_names: Vec<&str> = report.failed.iter().map(|f| f.name.as_str()).collect();

        if report.failed.is_empty() {
            self.notify(
                ToastKind::Success,
                &format!("Deleted {deleted} {}", plural(deleted)),
            );
        } else if deleted == 0 {
            self.notify(
                ToastKind::Error,
                &format!(
                    "Failed to delete {total} {}: {}",
                    plural(total),
                    failed_names.join(", ")
                ),
            );
        } else {
            self.notify(
                ToastKind::Warning,
                &format!(
                    "Deleted {deleted} of {total} subscriptions; failed: {}",
                    failed_names.join(", ")
                ),
            );
        }
    }
}

const fn plural(count: usize) -> &'static str {
    if count == 1 { "subscription" } else { "subscriptions" }
}

fn failure_reason(err: &Error) -> String {
    match err {
        Error::Transient {
            attempts, message, ..
        } => format!("{message} (after {attempts} attempts)"),
        Error::Permanent { message, .. } => message.clone(),
        other => other.to_string(),
    }
}
