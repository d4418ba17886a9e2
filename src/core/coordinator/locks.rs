//! Per-subscription mutation guards.
//!
//! Each identifier maps to a fair `tokio::sync::Mutex`. Under the reject policy a
//! busy lock fails immediately; under the queue policy waiters are served in FIFO
//! order. Entries are pruned once nobody holds or waits on them.

use crate::core::subscription::SubscriptionId;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// What happens when a mutation targets a subscription that already has one in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Fail the second mutation with a conflict error
    #[default]
    Reject,
    /// Run the second mutation after the first one settles
    Queue,
}

type LockTable = HashMap<SubscriptionId, Arc<AsyncMutex<()>>>;

/// Table of per-identifier locks.
#[derive(Debug, Default, Clone)]
pub struct EntityLocks {
    table: Arc<Mutex<LockTable>>,
}

/// Holds the locks for one or more identifiers until dropped.
#[derive(Debug)]
pub struct EntityGuard {
    held: Vec<(SubscriptionId, OwnedMutexGuard<()>)>,
    table: Arc<Mutex<LockTable>>,
}

impl EntityGuard {
    /// Identifiers covered by this guard.
    pub fn ids(&self) -> impl Iterator<Item = &SubscriptionId> {
        self.held.iter().map(|(id, _)| id)
    }

    /// Adds another guard's locks to this one.
    pub fn absorb(&mut self, mut other: Self) {
        self.held.append(&mut other.held);
    }
}

impl Drop for EntityGuard {
    fn drop(&mut self) {
        let ids: Vec<SubscriptionId> = self.held.drain(..).map(|(id, _)| id).collect();
        let mut table = lock_table(&self.table);
        for id in ids {
            if table.get(&id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
                table.remove(&id);
            }
        }
    }
}

fn lock_table(table: &Mutex<LockTable>) -> MutexGuard<'_, LockTable> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

impl EntityLocks {
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, id: &SubscriptionId) -> Arc<AsyncMutex<()>> {
        Arc::clone(lock_table(&self.table).entry(id.clone()).or_default())
    }

    fn guard(&self, id: SubscriptionId, held: OwnedMutexGuard<()>) -> EntityGuard {
        EntityGuard {
            held: vec![(id, held)],
            table: Arc::clone(&self.table),
        }
    }

    /// An empty guard that holds nothing yet.
    #[must_use]
    pub fn empty_guard(&self) -> EntityGuard {
        EntityGuard {
            held: Vec::new(),
            table: Arc::clone(&self.table),
        }
    }

    /// Takes the lock for `id` without waiting; `None` if another mutation holds it.
    #[must_use]
    pub fn try_acquire(&self, id: &SubscriptionId) -> Option<EntityGuard> {
        let held = self.handle(id).try_lock_owned().ok()?;
        Some(self.guard(id.clone(), held))
    }

    /// Waits (FIFO) for the lock on `id`.
    pub async fn acquire(&self, id: &SubscriptionId) -> EntityGuard {
        let handle = self.handle(id);
        let held = handle.lock_owned().await;
        self.guard(id.clone(), held)
    }

    /// True while some mutation holds the lock for `id`.
    #[must_use]
    pub fn is_locked(&self, id: &SubscriptionId) -> bool {
        lock_table(&self.table)
            .get(id)
            .is_some_and(|lock| lock.try_lock().is_err())
    }

    /// Number of identifiers currently tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        lock_table(&self.table).len()
    }

    /// True when no identifier is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_try_acquire_rejects_busy_id() {
        let locks = EntityLocks::new();
        let id = SubscriptionId::new("netflix");

        let guard = locks.try_acquire(&id);
        assert!(guard.is_some());
        assert!(locks.is_locked(&id));
        assert!(locks.try_acquire(&id).is_none());

        drop(guard);
        assert!(!locks.is_locked(&id));
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_different_ids_do_not_block() {
        let locks = EntityLocks::new();
        let _a = locks.try_acquire(&"a".into());
        assert!(locks.try_acquire(&"b".into()).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiters_are_served_in_order() {
        let locks = EntityLocks::new();
        let id = SubscriptionId::new("netflix");
        let order = Arc::new(Mutex::new(Vec::new()));

        let first = locks.acquire(&id).await;
        let mut tasks = Vec::new();
        for n in 0..3 {
            let locks = locks.clone();
            let id = id.clone();
            let order = Arc::clone(&order);
            tasks.push(tokio::spawn(async move {
                let _guard = locks.acquire(&id).await;
                order.lock().unwrap_or_else(PoisonError::into_inner).push(n);
            }));
            // Let each waiter enqueue before spawning the next
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        drop(first);
        for task in tasks {
            let _ = task.await;
        }

        let order = order.lock().unwrap_or_else(PoisonError::into_inner).clone();
        assert_eq!(order, vec![0, 1, 2]);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_absorbed_guards_release_together() {
        let locks = EntityLocks::new();
        let mut guard = locks.empty_guard();
        guard.absorb(locks.acquire(&"a".into()).await);
        guard.absorb(locks.acquire(&"b".into()).await);
        assert_eq!(guard.ids().count(), 2);
        assert_eq!(locks.len(), 2);

        drop(guard);
        assert!(locks.is_empty());
    }
}
