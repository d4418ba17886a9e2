//! Mock remote store for tests.
//!
//! Keeps records in memory and lets tests control failures and latency, then
//! verify how often each call was made.

use super::{BulkDeleteResults, RemoteStore, StoreError, StoreResult};
use crate::core::subscription::{Subscription, SubscriptionId, SubscriptionPatch};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// In-memory store with scriptable failures.
///
/// Failure sources, checked in this order on every call after the latency delay:
/// 1. the next queued failure from [`MockStore::push_failure`] (consumed)
/// 2. the standing failure from [`MockStore::fail_always`]
///
/// `bulk_delete` additionally consults per-id failures from
/// [`MockStore::fail_bulk_id`] for ids that reach the batch.
#[derive(Debug, Default)]
pub struct MockStore {
    records: Mutex<Vec<Subscription>>,
    queued_failures: Mutex<VecDeque<StoreError>>,
    standing_failure: Mutex<Option<StoreError>>,
    bulk_failures: Mutex<HashMap<SubscriptionId, StoreError>>,
    latency: Mutex<Duration>,
    last_bulk_ids: Mutex<Vec<SubscriptionId>>,
    fetch_count: AtomicUsize,
    create_count: AtomicUsize,
    update_count: AtomicUsize,
    delete_count: AtomicUsize,
    bulk_delete_count: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockStore {
    /// Creates an empty mock store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock store pre-populated with `records`.
    #[must_use]
    pub fn with_records(records: Vec<Subscription>) -> Self {
        let store = Self::new();
        *lock(&store.records) = records;
        store
    }

    /// Fails the next call with `error`. Queued failures are consumed in order.
    pub fn push_failure(&self, error: StoreError) {
        lock(&self.queued_failures).push_back(error);
    }

    /// Fails every call with `error` until [`MockStore::clear_failures`].
    pub fn fail_always(&self, error: StoreError) {
        *lock(&self.standing_failure) = Some(error);
    }

    /// Rejects `id` inside every batch delete that contains it.
    pub fn fail_bulk_id(&self, id: SubscriptionId, error: StoreError) {
        lock(&self.bulk_failures).insert(id, error);
    }

    /// Removes all scripted failures.
    pub fn clear_failures(&self) {
        lock(&self.queued_failures).clear();
        *lock(&self.standing_failure) = None;
        lock(&self.bulk_failures).clear();
    }

    /// Delays every call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        *lock(&self.latency) = latency;
    }

    /// Current stored records.
    #[must_use]
    pub fn records(&self) -> Vec<Subscription> {
        lock(&self.records).clone()
    }

    /// Identifiers passed to the most recent `bulk_delete`.
    #[must_use]
    pub fn last_bulk_ids(&self) -> Vec<SubscriptionId> {
        lock(&self.last_bulk_ids).clone()
    }

    /// Number of `fetch_all()` invocations.
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::Relaxed)
    }

    /// Number of `create()` invocations.
    pub fn create_count(&self) -> usize {
        self.create_count.load(Ordering::Relaxed)
    }

    /// Number of `update()` invocations.
    pub fn update_count(&self) -> usize {
        self.update_count.load(Ordering::Relaxed)
    }

    /// Number of `delete()` invocations.
    pub fn delete_count(&self) -> usize {
        self.delete_count.load(Ordering::Relaxed)
    }

    /// Number of `bulk_delete()` invocations.
    pub fn bulk_delete_count(&self) -> usize {
        self.bulk_delete_count.load(Ordering::Relaxed)
    }

    async fn begin_call(&self, counter: &AtomicUsize) -> StoreResult<()> {
        counter.fetch_add(1, Ordering::Relaxed);

        let latency = *lock(&self.latency);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if let Some(error) = lock(&self.queued_failures).pop_front() {
            return Err(error);
        }
        if let Some(error) = lock(&self.standing_failure).clone() {
            return Err(error);
        }
        Ok(())
    }

    fn remove_record(&self, id: &SubscriptionId) -> StoreResult<()> {
        let mut records = lock(&self.records);
        let before = records.len();
        records.retain(|record| &record.id != id);
        if records.len() == before {
            return Err(StoreError::NotFound { id: id.to_string() });
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for MockStore {
    async fn fetch_all(&self) -> StoreResult<Vec<Subscription>> {
        self.begin_call(&self.fetch_count).await?;
        Ok(self.records())
    }

    async fn create(&self, record: &Subscription) -> StoreResult<Subscription> {
        self.begin_call(&self.create_count).await?;
        let mut records = lock(&self.records);
        if records.iter().any(|existing| existing.id == record.id) {
            return Err(StoreError::Rejected {
                message: format!("duplicate id {}", record.id),
            });
        }
        records.push(record.clone());
        Ok(record.clone())
    }

    async fn update(
        &self,
        id: &SubscriptionId,
        patch: &SubscriptionPatch,
    ) -> StoreResult<Subscription> {
        self.begin_call(&self.update_count).await?;
        let mut records = lock(&self.records);
        let record = records
            .iter_mut()
            .find(|record| &record.id == id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;
        *record = record.apply_patch(patch, Utc::now());
        Ok(record.clone())
    }

    async fn delete(&self, id: &SubscriptionId) -> StoreResult<()> {
        self.begin_call(&self.delete_count).await?;
        self.remove_record(id)
    }

    async fn bulk_delete(&self, ids: &[SubscriptionId]) -> StoreResult<BulkDeleteResults> {
        self.begin_call(&self.bulk_delete_count).await?;
        *lock(&self.last_bulk_ids) = ids.to_vec();

        let failures = lock(&self.bulk_failures).clone();
        Ok(ids
            .iter()
            .map(|id| {
                let outcome = match failures.get(id) {
                    Some(error) => Err(error.clone()),
                    None => self.remove_record(id),
                };
                (id.clone(), outcome)
            })
            .collect())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
