//! Immutable collection snapshots.
//!
//! A `Snapshot` is the full, ordered subscription collection at one instant. It is
//! shared behind an `Arc`, so cloning is cheap; every mutating helper returns a new
//! snapshot and leaves the receiver untouched.

use super::subscription::{Subscription, SubscriptionId};
use std::collections::HashSet;
use std::ops::Deref;
use std::sync::Arc;

/// Ordered, immutable sequence of subscription records.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot(Arc<Vec<Subscription>>);

impl Snapshot {
    /// Builds a snapshot from owned records.
    #[must_use]
    pub fn new(records: Vec<Subscription>) -> Self {
        Self(Arc::new(records))
    }

    /// Looks up a record by identifier.
    #[must_use]
    pub fn get(&self, id: &SubscriptionId) -> Option<&Subscription> {
        self.0.iter().find(|record| &record.id == id)
    }

    /// Position of a record in the collection.
    #[must_use]
    pub fn position(&self, id: &SubscriptionId) -> Option<usize> {
        self.0.iter().position(|record| &record.id == id)
    }

    /// True when a record with this identifier is present.
    #[must_use]
    pub fn contains(&self, id: &SubscriptionId) -> bool {
        self.position(id).is_some()
    }

    /// Identifiers in collection order.
    #[must_use]
    pub fn ids(&self) -> Vec<SubscriptionId> {
        self.0.iter().map(|record| record.id.clone()).collect()
    }

    /// New snapshot with `record` appended.
    #[must_use]
    pub fn with_inserted(&self, record: Subscription) -> Self {
        let mut records = self.to_vec();
        records.push(record);
        Self::new(records)
    }

    /// New snapshot where the record sharing `record.id` is replaced in place.
    /// Returns an unchanged copy if the identifier is absent.
    #[must_use]
    pub fn with_replaced(&self, record: Subscription) -> Self {
        let records = self
            .0
            .iter()
            .map(|existing| {
                if existing.id == record.id {
                    record.clone()
                } else {
                    existing.clone()
                }
            })
            .collect();
        Self::new(records)
    }

    /// New snapshot without any of the given identifiers.
    #[must_use]
    pub fn without(&self, ids: &[SubscriptionId]) -> Self {
        let drop: HashSet<&SubscriptionId> = ids.iter().collect();
        Self::new(
            self.0
                .iter()
                .filter(|record| !drop.contains(&record.id))
                .cloned()
                .collect(),
        )
    }

    /// Restores the entries for `ids` to how they looked in `previous`.
    ///
    /// Each id is first removed from `self`; ids that existed in `previous` are then
    /// reinserted at their former position (clamped to the current length). Entries
    /// for other identifiers are left exactly as they are in `self`, so rolling back
    /// one entity never disturbs changes made to another.
    #[must_use]
    pub fn restore_entries(&self, previous: &Self, ids: &[SubscriptionId]) -> Self {
        let mut records = self.without(ids).to_vec();
        let targets: HashSet<&SubscriptionId> = ids.iter().collect();

        for (index, record) in previous.iter().enumerate() {
            if targets.contains(&record.id) {
                let at = index.min(records.len());
                records.insert(at, record.clone());
            }
        }

        Self::new(records)
    }
}

impl Deref for Snapshot {
    type Target = [Subscription];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Subscription>> for Snapshot {
    fn from(records: Vec<Subscription>) -> Self {
        Self::new(records)
    }
}
