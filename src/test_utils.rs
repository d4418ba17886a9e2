//! Shared test utilities for `SubscriptionBuddy`.
//!
//! Fixtures mirror the three records the dashboard ships with (Netflix, Spotify,
//! Adobe). Timestamps are whole seconds so records survive a database round trip
//! unchanged.

#![allow(clippy::unwrap_used)]

use crate::core::coordinator::{Coordinator, CoordinatorSettings};
use crate::core::retry::RetryPolicy;
use crate::core::snapshot::Snapshot;
use crate::core::subscription::{
    BillingCycle, Subscription, SubscriptionDraft, SubscriptionStatus,
};
use crate::errors::Result;
use crate::store::MockStore;
use crate::ui::ToastQueue;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Owner used by every fixture.
pub const TEST_USER: &str = "user-1";

/// Routes `tracing` output to the test harness. Safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

fn date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

fn tags(values: &[&str]) -> std::collections::BTreeSet<String> {
    values.iter().map(ToString::to_string).collect()
}

/// Netflix, id "1", 15.99 USD monthly.
pub fn netflix() -> Subscription {
    Subscription {
        id: "1".into(),
        name: "Netflix".to_string(),
        category: "Streaming".to_string(),
        price: 15.99,
        currency: "USD".to_string(),
        billing_cycle: BillingCycle::Monthly,
        next_billing_date: date(2024, 2, 15),
        status: SubscriptionStatus::Active,
        tags: tags(&["entertainment", "streaming"]),
        description: Some("Streaming service for movies and TV shows".to_string()),
        notes: None,
        website: Some("https://netflix.com".to_string()),
        icon: Some("N".to_string()),
        color: Some("#E50914".to_string()),
        logo_url: None,
        created_at: at(2024, 1, 1),
        updated_at: at(2024, 1, 1),
        user_id: TEST_USER.to_string(),
    }
}

/// Spotify Premium, id "2", 9.99 USD monthly.
pub fn spotify() -> Subscription {
    Subscription {
        id: "2".into(),
        name: "Spotify Premium".to_string(),
        category: "Music".to_string(),
        price: 9.99,
        currency: "USD".to_string(),
        billing_cycle: BillingCycle::Monthly,
        next_billing_date: date(2024, 2, 20),
        status: SubscriptionStatus::Active,
        tags: tags(&["music"]),
        description: Some("Music streaming".to_string()),
        notes: None,
        website: Some("https://spotify.com".to_string()),
        icon: Some("S".to_string()),
        color: Some("#1DB954".to_string()),
        logo_url: None,
        created_at: at(2024, 1, 2),
        updated_at: at(2024, 1, 2),
        user_id: TEST_USER.to_string(),
    }
}

/// Adobe Creative Cloud, id "3", 52.99 USD monthly.
pub fn adobe() -> Subscription {
    Subscription {
        id: "3".into(),
        name: "Adobe Creative Cloud".to_string(),
        category: "Design".to_string(),
        price: 52.99,
        currency: "USD".to_string(),
        billing_cycle: BillingCycle::Monthly,
        next_billing_date: date(2024, 2, 5),
        status: SubscriptionStatus::Active,
        tags: tags(&["design", "work"]),
        description: Some("Creative software suite".to_string()),
        notes: Some("Annual plan billed monthly".to_string()),
        website: Some("https://adobe.com".to_string()),
        icon: Some("A".to_string()),
        color: Some("#FF0000".to_string()),
        logo_url: None,
        created_at: at(2024, 1, 3),
        updated_at: at(2024, 1, 3),
        user_id: TEST_USER.to_string(),
    }
}

/// Netflix and Spotify.
pub fn sample_snapshot() -> Snapshot {
    Snapshot::new(vec![netflix(), spotify()])
}

/// A valid, active draft named `name`.
pub fn sample_draft(name: &str) -> SubscriptionDraft {
    SubscriptionDraft {
        name: name.to_string(),
        category: "Streaming".to_string(),
        price: 7.99,
        currency: "USD".to_string(),
        billing_cycle: BillingCycle::Monthly,
        next_billing_date: date(2024, 3, 1),
        status: SubscriptionStatus::Active,
        tags: tags(&["streaming"]),
        description: None,
        notes: None,
        website: None,
        icon: None,
        color: None,
        logo_url: None,
        user_id: TEST_USER.to_string(),
    }
}

/// Settings with short, deterministic retry timings for paused-clock tests.
pub fn fast_settings() -> CoordinatorSettings {
    CoordinatorSettings {
        retry: RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 1_000,
            attempt_timeout_ms: 1_000,
        },
        ..CoordinatorSettings::default()
    }
}

/// Coordinator over a mock store seeded with `records`, plus its toast queue.
pub fn mock_coordinator(
    store: &Arc<MockStore>,
    settings: CoordinatorSettings,
    records: Vec<Subscription>,
) -> (Arc<Coordinator>, Arc<ToastQueue>) {
    let toasts = Arc::new(ToastQueue::new(32));
    let coordinator = Coordinator::new(
        Arc::clone(store) as Arc<dyn crate::store::RemoteStore>,
        Arc::clone(&toasts) as Arc<dyn crate::core::notify::Notifier>,
        settings,
        records,
    );
    (Arc::new(coordinator), toasts)
}
