//! Online/offline signal shared by the coordinator and whoever observes the network.

use tokio::sync::watch;

/// Current connectivity, observable through a `watch` channel.
#[derive(Debug)]
pub struct Connectivity {
    tx: watch::Sender<bool>,
}

impl Connectivity {
    /// Starts in the given state.
    #[must_use]
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self { tx }
    }

    /// Last reported state.
    #[must_use]
    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Records a new state. Returns `true` if it differs from the previous one.
    pub fn set_online(&self, online: bool) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        })
    }

    /// Receiver that observes every change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Resolves once the state is online.
    pub async fn wait_online(&self) {
        let mut rx = self.subscribe();
        // The sender lives as long as `self`, so this only errs during shutdown
        let _ = rx.wait_for(|online| *online).await;
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_set_online_reports_changes_only() {
        let connectivity = Connectivity::default();
        assert!(connectivity.is_online());
        assert!(!connectivity.set_online(true));
        assert!(connectivity.set_online(false));
        assert!(!connectivity.is_online());
    }

    #[tokio::test]
    async fn test_wait_online_resolves_after_reconnect() {
        let connectivity = Arc::new(Connectivity::new(false));
        let waiter = {
            let connectivity = Arc::clone(&connectivity);
            tokio::spawn(async move { connectivity.wait_online().await })
        };

        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        connectivity.set_online(true);
        assert!(waiter.await.is_ok());
    }
}
