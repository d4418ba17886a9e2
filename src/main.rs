use chrono::Utc;
use dotenvy::dotenv;
use std::sync::Arc;
use subscription_buddy::config::{app, database, seed};
use subscription_buddy::core::analytics::{spending_summary, upcoming_renewals};
use subscription_buddy::core::coordinator::Coordinator;
use subscription_buddy::core::notify::TracingNotifier;
use subscription_buddy::errors::Result;
use subscription_buddy::store::DatabaseStore;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load configuration
    let config = app::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;

    // 4. Connect and create tables
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db).await?;
    let store = Arc::new(DatabaseStore::new(db));

    // 5. Seed on first run
    seed::seed_subscriptions(store.as_ref(), &config.subscriptions)
        .await
        .inspect_err(|e| error!("Failed to seed subscriptions: {}", e))?;

    // 6. Build the coordinator and load the collection
    let coordinator = Coordinator::new(
        store,
        Arc::new(TracingNotifier),
        config.coordinator.clone(),
        Vec::new(),
    );
    coordinator.load().await?;

    // 7. Report the dashboard summary
    let snapshot = coordinator.subscriptions();
    let summary = spending_summary(&snapshot, config.dashboard.budget_limit);
    info!(
        active = summary.active,
        paused = summary.paused,
        cancelled = summary.cancelled,
        monthly = %format!("{:.2}", summary.monthly_total),
        yearly = %format!("{:.2}", summary.yearly_total),
        budget_used = %format!("{:.1}%", summary.budget_used_percent),
        over_budget = summary.over_budget,
        "spending summary"
    );
    if summary.is_multi_currency() {
        warn!(currencies = ?summary.by_currency, "totals mix currencies");
    }
    let today = Utc::now().date_naive();
    for renewal in upcoming_renewals(&snapshot, today, config.dashboard.renewal_window_days) {
        info!(
            name = %renewal.name,
            date = %renewal.date,
            days = renewal.days_until,
            price = %format!("{:.2} {}", renewal.price, renewal.currency),
            "upcoming renewal"
        );
    }

    coordinator.teardown();
    Ok(())
}
