//! User-visible notifications.
//!
//! The coordinator reports every terminal outcome through a [`Notifier`]. The UI layer
//! supplies [`crate::ui::ToastQueue`]; headless callers can use [`TracingNotifier`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Visual kind of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    /// Operation completed
    Success,
    /// Operation failed
    Error,
    /// Neutral information
    Info,
    /// Degraded but not failed
    Warning,
}

impl ToastKind {
    /// Icon shown next to the message.
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Success => "✓",
            Self::Error => "✗",
            Self::Info => "ℹ",
            Self::Warning => "⚠",
        }
    }
}

impl fmt::Display for ToastKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
            Self::Warning => "warning",
        };
        f.write_str(label)
    }
}

/// Sink for user-visible messages.
pub trait Notifier: Send + Sync {
    /// Shows one toast.
    fn show_toast(&self, kind: ToastKind, message: &str);
}

/// Notifier that only writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn show_toast(&self, kind: ToastKind, message: &str) {
        match kind {
            ToastKind::Error => tracing::error!(%kind, "{}", message),
            ToastKind::Warning => tracing::warn!(%kind, "{}", message),
            ToastKind::Success | ToastKind::Info => tracing::info!(%kind, "{}", message),
        }
    }
}
