//! Seeds the store with the subscriptions listed in `config.toml`.

use crate::core::subscription::{SubscriptionDraft, SubscriptionId};
use crate::core::validation::validate_draft;
use crate::errors::{Error, Result};
use crate::store::RemoteStore;
use chrono::Utc;
use tracing::{info, warn};

/// Inserts `seeds` when the store is empty. Returns how many records were inserted.
///
/// Seeds that fail validation are skipped with a warning. A store that already
/// holds records is left untouched.
pub async fn seed_subscriptions(store: &dyn RemoteStore, seeds: &[SubscriptionDraft]) -> Result<usize> {
    let existing = store
        .fetch_all()
        .await
        .map_err(|e| Error::from_store("fetch", 1, &e))?;
    if !existing.is_empty() {
        info!(existing = existing.len(), "store already populated, skipping seed");
        return Ok(0);
    }

    let now = Utc::now();
    let mut inserted = 0;
    for seed in seeds {
        let errors = validate_draft(seed);
        if !errors.is_empty() {
            warn!(name = %seed.name, ?errors, "skipping invalid seed subscription");
            continue;
        }
        let record = seed.clone().into_subscription(SubscriptionId::generate(), now);
        store
            .create(&record)
            .await
            .map_err(|e| Error::from_store("create", 1, &e))?;
        inserted += 1;
    }

    info!(inserted, "seeded subscriptions");
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::store::{DatabaseStore, MockStore};
    use crate::test_utils::{netflix, sample_draft, setup_test_db};

    #[tokio::test]
    async fn test_seeds_empty_database() -> Result<()> {
        let store = DatabaseStore::new(setup_test_db().await?);

        let inserted =
            seed_subscriptions(&store, &[sample_draft("Hulu"), sample_draft("Max")]).await?;

        assert_eq!(inserted, 2);
        assert_eq!(store.fetch_all().await.unwrap().len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_populated_store_is_left_alone() -> Result<()> {
        let store = MockStore::with_records(vec![netflix()]);

        let inserted = seed_subscriptions(&store, &[sample_draft("Hulu")]).await?;

        assert_eq!(inserted, 0);
        assert_eq!(store.create_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_seed_is_skipped() -> Result<()> {
        let store = MockStore::new();
        let mut bad = sample_draft("Broken");
        bad.price = -5.0;

        let inserted = seed_subscriptions(&store, &[bad, sample_draft("Hulu")]).await?;

        assert_eq!(inserted, 1);
        assert_eq!(store.records()[0].name, "Hulu");
        Ok(())
    }
}
