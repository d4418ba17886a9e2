//! Bounded toast queue backing the notification area.

use crate::core::notify::{Notifier, ToastKind};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Toasts kept before the oldest is dropped.
pub const DEFAULT_TOAST_CAPACITY: usize = 5;

/// A single visible toast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    /// Identifier used to dismiss it
    pub id: u64,
    /// Visual kind
    pub kind: ToastKind,
    /// Text shown to the user
    pub message: String,
}

#[derive(Debug)]
struct Inner {
    toasts: VecDeque<Toast>,
    next_id: u64,
}

/// Thread-safe toast queue; the oldest toast is evicted when full.
#[derive(Debug)]
pub struct ToastQueue {
    inner: Mutex<Inner>,
    capacity: usize,
}

impl ToastQueue {
    /// Creates a queue holding at most `capacity` toasts (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                toasts: VecDeque::new(),
                next_id: 1,
            }),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a toast and returns its id.
    pub fn push(&self, kind: ToastKind, message: impl Into<String>) -> u64 {
        let mut inner = self.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        if inner.toasts.len() == self.capacity {
            inner.toasts.pop_front();
        }
        inner.toasts.push_back(Toast {
            id,
            kind,
            message: message.into(),
        });
        id
    }

    /// Removes the toast with `id`. Returns whether it was visible.
    pub fn dismiss(&self, id: u64) -> bool {
        let mut inner = self.lock();
        let before = inner.toasts.len();
        inner.toasts.retain(|toast| toast.id != id);
        inner.toasts.len() != before
    }

    /// Visible toasts, oldest first.
    #[must_use]
    pub fn visible(&self) -> Vec<Toast> {
        self.lock().toasts.iter().cloned().collect()
    }

    /// Removes and returns every visible toast.
    pub fn drain(&self) -> Vec<Toast> {
        self.lock().toasts.drain(..).collect()
    }

    /// Number of visible toasts whose message starts with `prefix`.
    #[must_use]
    pub fn count_starting_with(&self, prefix: &str) -> usize {
        self.lock()
            .toasts
            .iter()
            .filter(|toast| toast.message.starts_with(prefix))
            .count()
    }

    /// Number of visible toasts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().toasts.len()
    }

    /// True when nothing is visible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_CAPACITY)
    }
}

impl Notifier for ToastQueue {
    fn show_toast(&self, kind: ToastKind, message: &str) {
        let id = self.push(kind, message);
        debug!(id, %kind, "toast shown");
    }
}
