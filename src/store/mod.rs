//! Remote store layer.
//!
//! The coordinator talks to persistence only through the [`RemoteStore`] trait. Two
//! implementations ship with the crate:
//!
//! - [`DatabaseStore`]: `SeaORM` over the `subscriptions` table
//! - [`MockStore`]: scriptable in-memory store for tests and demos
//!
//! Failures are reported as [`StoreError`], which tells the retry policy whether a
//! call is worth repeating.

mod database;
mod error;
mod mock;

pub use database::DatabaseStore;
pub use error::{StoreError, StoreResult};
pub use mock::MockStore;

use crate::core::subscription::{Subscription, SubscriptionId, SubscriptionPatch};
use async_trait::async_trait;

/// Per-identifier outcome of a batch delete.
pub type BulkDeleteResults = Vec<(SubscriptionId, StoreResult<()>)>;

/// Persistence backend for subscription records.
///
/// A call that fails as a whole returns `Err`; `bulk_delete` additionally reports
/// one result per identifier when the batch itself went through.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Loads every record.
    async fn fetch_all(&self) -> StoreResult<Vec<Subscription>>;

    /// Persists a new record. The identifier is chosen by the caller.
    async fn create(&self, record: &Subscription) -> StoreResult<Subscription>;

    /// Applies `patch` to the stored record and returns the result.
    async fn update(
        &self,
        id: &SubscriptionId,
        patch: &SubscriptionPatch,
    ) -> StoreResult<Subscription>;

    /// Removes one record.
    async fn delete(&self, id: &SubscriptionId) -> StoreResult<()>;

    /// Removes several records in one call.
    async fn bulk_delete(&self, ids: &[SubscriptionId]) -> StoreResult<BulkDeleteResults>;

    /// Name used in logs.
    fn name(&self) -> &str;
}
