//! `SeaORM` implementation of the remote store.

use super::{BulkDeleteResults, RemoteStore, StoreError, StoreResult};
use crate::core::subscription::{Subscription, SubscriptionId, SubscriptionPatch};
use crate::entities::{SubscriptionColumn, SubscriptionEntity, subscription};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use std::collections::BTreeSet;
use tracing::debug;

/// Remote store backed by a `SeaORM` connection.
#[derive(Debug, Clone)]
pub struct DatabaseStore {
    db: DatabaseConnection,
}

impl DatabaseStore {
    /// Wraps an open connection. Tables must already exist.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    async fn find(&self, id: &SubscriptionId) -> StoreResult<subscription::Model> {
        SubscriptionEntity::find_by_id(id.as_str().to_string())
            .one(&self.db)
            .await?
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }
}

/// Converts a database row into a domain record.
pub(crate) fn model_to_record(model: subscription::Model) -> StoreResult<Subscription> {
    let billing_cycle = model
        .billing_cycle
        .parse()
        .map_err(|e| StoreError::Database(format!("row {}: {e}", model.id)))?;
    let status = model
        .status
        .parse()
        .map_err(|e| StoreError::Database(format!("row {}: {e}", model.id)))?;
    let tags: BTreeSet<String> = serde_json::from_str(&model.tags)
        .map_err(|e| StoreError::Database(format!("row {}: bad tags: {e}", model.id)))?;

    Ok(Subscription {
        id: SubscriptionId::new(model.id),
        name: model.name,
        category: model.category,
        price: model.price,
        currency: model.currency,
        billing_cycle,
        next_billing_date: model.next_billing_date,
        status,
        tags,
        description: model.description,
        notes: model.notes,
        website: model.website,
        icon: model.icon,
        color: model.color,
        logo_url: model.logo_url,
        created_at: model.created_at,
        updated_at: model.updated_at,
        user_id: model.user_id,
    })
}

/// Converts a domain record into a fully-set active model.
pub(crate) fn record_to_active(record: &Subscription) -> StoreResult<subscription::ActiveModel> {
    let tags = serde_json::to_string(&record.tags)
        .map_err(|e| StoreError::Rejected {
            message: format!("tags could not be encoded: {e}"),
        })?;

    Ok(subscription::ActiveModel {
        id: Set(record.id.as_str().to_string()),
        name: Set(record.name.clone()),
        category: Set(record.category.clone()),
        price: Set(record.price),
        currency: Set(record.currency.clone()),
        billing_cycle: Set(record.billing_cycle.as_str().to_string()),
        next_billing_date: Set(record.next_billing_date),
        status: Set(record.status.as_str().to_string()),
        tags: Set(tags),
        description: Set(record.description.clone()),
        notes: Set(record.notes.clone()),
        website: Set(record.website.clone()),
        icon: Set(record.icon.clone()),
        color: Set(record.color.clone()),
        logo_url: Set(record.logo_url.clone()),
        created_at: Set(record.created_at),
        updated_at: Set(record.updated_at),
        user_id: Set(record.user_id.clone()),
    })
}

#[async_trait]
impl RemoteStore for DatabaseStore {
    async fn fetch_all(&self) -> StoreResult<Vec<Subscription>> {
        SubscriptionEntity::find()
            .order_by_asc(SubscriptionColumn::CreatedAt)
            .order_by_asc(SubscriptionColumn::Name)
            .all(&self.db)
            .await?
            .into_iter()
            .map(model_to_record)
            .collect()
    }

    async fn create(&self, record: &Subscription) -> StoreResult<Subscription> {
        debug!(id = %record.id, name = %record.name, "inserting subscription");
        let model = record_to_active(record)?.insert(&self.db).await?;
        model_to_record(model)
    }

    async fn update(
        &self,
        id: &SubscriptionId,
        patch: &SubscriptionPatch,
    ) -> StoreResult<Subscription> {
        let current = model_to_record(self.find(id).await?)?;
        let patched = current.apply_patch(patch, Utc::now());
        let model = record_to_active(&patched)?.update(&self.db).await?;
        model_to_record(model)
    }

    async fn delete(&self, id: &SubscriptionId) -> StoreResult<()> {
        let result = SubscriptionEntity::delete_by_id(id.as_str().to_string())
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(StoreError::NotFound { id: id.to_string() });
        }
        Ok(())
    }

    async fn bulk_delete(&self, ids: &[SubscriptionId]) -> StoreResult<BulkDeleteResults> {
        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            let outcome = self.delete(id).await;
            results.push((id.clone(), outcome));
        }
        Ok(results)
    }

    fn name(&self) -> &str {
        "database"
    }
}
