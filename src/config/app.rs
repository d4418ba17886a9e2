//! Application configuration loaded from `config.toml`.
//!
//! Every section is optional and falls back to defaults, so an empty file (or none
//! at all, see [`load_default_config`]) yields a working setup.

use crate::core::analytics::DEFAULT_BUDGET_LIMIT;
use crate::core::coordinator::CoordinatorSettings;
use crate::core::subscription::SubscriptionDraft;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

/// Used when `CONFIG_PATH` is not set.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// The whole `config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// `[coordinator]` and `[coordinator.retry]`
    pub coordinator: CoordinatorSettings,
    /// `[dashboard]`
    pub dashboard: DashboardSettings,
    /// `[[subscriptions]]` seed records
    pub subscriptions: Vec<SubscriptionDraft>,
}

/// Dashboard display settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    /// Monthly budget shown against spending
    pub budget_limit: f64,
    /// How far ahead renewal reminders look, in days
    pub renewal_window_days: i64,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            budget_limit: DEFAULT_BUDGET_LIMIT,
            renewal_window_days: 7,
        }
    }
}

/// Parses configuration from a TOML string.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads configuration from the TOML file at `path`.
///
/// # Errors
/// Returns an error if the file cannot be read or is not valid configuration.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!(
            "Failed to read config file {}: {e}",
            path.as_ref().display()
        ),
    })?;
    parse_config(&contents)
}

/// Loads configuration from `CONFIG_PATH` (default `config.toml`).
///
/// A missing file yields the defaults; a file that exists but does not parse is an error.
pub fn load_default_config() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    if !Path::new(&path).exists() {
        warn!(%path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }
    let config = load_config(&path)?;
    info!(
        %path,
        seeds = config.subscriptions.len(),
        policy = ?config.coordinator.conflict_policy,
        "configuration loaded"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::coordinator::ConflictPolicy;
    use crate::core::subscription::BillingCycle;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.coordinator, CoordinatorSettings::default());
        assert_eq!(config.dashboard.budget_limit, 500.0);
        assert!(config.subscriptions.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [coordinator]
            history_limit = 20
            conflict_policy = "queue"

            [coordinator.retry]
            max_attempts = 5
            base_delay_ms = 250

            [dashboard]
            budget_limit = 120.0

            [[subscriptions]]
            name = "Netflix"
            category = "Streaming"
            price = 15.99
            currency = "USD"
            billing_cycle = "monthly"
            next_billing_date = "2024-02-15"
            status = "active"
            tags = ["entertainment", "streaming"]
            user_id = "local"
        "#;

        let config = parse_config(toml_str).unwrap();

        assert_eq!(config.coordinator.history_limit, 20);
        assert_eq!(config.coordinator.conflict_policy, ConflictPolicy::Queue);
        assert_eq!(config.coordinator.retry.max_attempts, 5);
        assert_eq!(config.coordinator.retry.base_delay_ms, 250);
        // Unset retry fields keep their defaults
        assert_eq!(config.coordinator.retry.attempt_timeout_ms, 10_000);
        assert_eq!(config.dashboard.budget_limit, 120.0);
        assert_eq!(config.dashboard.renewal_window_days, 7);
        assert_eq!(config.subscriptions.len(), 1);
        assert_eq!(config.subscriptions[0].billing_cycle, BillingCycle::Monthly);
        assert!(config.subscriptions[0].tags.contains("streaming"));
    }

    #[test]
    fn test_unknown_policy_is_config_error() {
        let err = parse_config("[coordinator]\nconflict_policy = \"merge\"").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = load_config("does/not/exist.toml").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_bundled_config_parses() {
        let config = load_config(concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml")).unwrap();
        assert_eq!(config.subscriptions.len(), 3);
    }
}
