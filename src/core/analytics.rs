//! Spending analytics derived from a snapshot.
//!
//! Everything here is a pure function of the collection, so the dashboard can
//! recompute it after every published state without touching the store.

use super::snapshot::Snapshot;
use super::subscription::{BillingCycle, Subscription, SubscriptionId, SubscriptionStatus};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Monthly budget used when none is configured.
pub const DEFAULT_BUDGET_LIMIT: f64 = 500.0;

/// Price of `record` normalised to one month. Paused and cancelled records cost nothing.
#[must_use]
pub fn monthly_cost(record: &Subscription) -> f64 {
    if record.status != SubscriptionStatus::Active {
        return 0.0;
    }
    match record.billing_cycle {
        BillingCycle::Weekly => record.price * 52.0 / 12.0,
        BillingCycle::Monthly => record.price,
        BillingCycle::Quarterly => record.price / 3.0,
        BillingCycle::Yearly => record.price / 12.0,
    }
}

/// Totals shown on the dashboard.
///
/// `monthly_total`, `yearly_total`, `by_category` and the budget fields add prices
/// as-is and assume every record shares one currency. `by_currency` keeps the
/// per-currency totals for collections where that does not hold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpendingSummary {
    /// Sum of monthly costs of active records
    pub monthly_total: f64,
    /// `monthly_total * 12`
    pub yearly_total: f64,
    /// Monthly cost per category
    pub by_category: BTreeMap<String, f64>,
    /// Monthly cost per currency code
    pub by_currency: BTreeMap<String, f64>,
    /// Active records
    pub active: usize,
    /// Paused records
    pub paused: usize,
    /// Cancelled records
    pub cancelled: usize,
    /// Monthly budget the totals are compared against
    pub budget_limit: f64,
    /// `monthly_total / budget_limit` as a percentage (0 when the budget is 0)
    pub budget_used_percent: f64,
    /// Whether spending exceeds the budget
    pub over_budget: bool,
}

impl SpendingSummary {
    /// True when active records are billed in more than one currency.
    #[must_use]
    pub fn is_multi_currency(&self) -> bool {
        self.by_currency.len() > 1
    }
}

/// Summarises `snapshot` against a monthly `budget_limit`.
#[must_use]
pub fn spending_summary(snapshot: &Snapshot, budget_limit: f64) -> SpendingSummary {
    let mut by_category: BTreeMap<String, f64> = BTreeMap::new();
    let mut by_currency: BTreeMap<String, f64> = BTreeMap::new();
    let (mut active, mut paused, mut cancelled) = (0, 0, 0);
    let mut monthly_total = 0.0;

    for record in snapshot.iter() {
        match record.status {
            SubscriptionStatus::Active => {
                active += 1;
                let cost = monthly_cost(record);
                monthly_total += cost;
                *by_category.entry(record.category.clone()).or_default() += cost;
                *by_currency.entry(record.currency.clone()).or_default() += cost;
            }
            SubscriptionStatus::Paused => paused += 1,
            SubscriptionStatus::Cancelled => cancelled += 1,
        }
    }

    let budget_used_percent = if budget_limit > 0.0 {
        monthly_total / budget_limit * 100.0
    } else {
        0.0
    };

    SpendingSummary {
        monthly_total,
        yearly_total: monthly_total * 12.0,
        by_category,
        by_currency,
        active,
        paused,
        cancelled,
        budget_limit,
        budget_used_percent,
        over_budget: monthly_total > budget_limit,
    }
}

/// An active subscription that renews soon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Renewal {
    /// Subscription id
    pub id: SubscriptionId,
    /// Display name
    pub name: String,
    /// Charge date
    pub date: NaiveDate,
    /// Days from today, 0 means today
    pub days_until: i64,
    /// Amount charged
    pub price: f64,
    /// Currency of `price`
    pub currency: String,
}

/// Active records renewing within `within_days` of `today` (inclusive), soonest first.
#[must_use]
pub fn upcoming_renewals(snapshot: &Snapshot, today: NaiveDate, within_days: i64) -> Vec<Renewal> {
    let mut renewals: Vec<Renewal> = snapshot
        .iter()
        .filter(|record| record.status == SubscriptionStatus::Active)
        .filter_map(|record| {
            let date = record.next_billing_date?;
            let days_until = (date - today).num_days();
            (0..=within_days).contains(&days_until).then(|| Renewal {
                id: record.id.clone(),
                name: record.name.clone(),
                date,
                days_until,
                price: record.price,
                currency: record.currency.clone(),
            })
        })
        .collect();
    renewals.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.name.cmp(&b.name)));
    renewals
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::{adobe, netflix, spotify};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_monthly_cost_normalises_cycles() {
        let mut record = netflix();
        assert_eq!(monthly_cost(&record), 15.99);

        record.billing_cycle = BillingCycle::Yearly;
        record.price = 120.0;
        assert!(close(monthly_cost(&record), 10.0));

        record.billing_cycle = BillingCycle::Weekly;
        record.price = 3.0;
        assert!(close(monthly_cost(&record), 13.0));

        record.billing_cycle = BillingCycle::Quarterly;
        record.price = 30.0;
        assert!(close(monthly_cost(&record), 10.0));

        record.status = SubscriptionStatus::Paused;
        assert_eq!(monthly_cost(&record), 0.0);
    }

    #[test]
    fn test_spending_summary() {
        let mut paused = spotify();
        paused.status = SubscriptionStatus::Paused;
        let snapshot = Snapshot::new(vec![netflix(), paused, adobe()]);

        let summary = spending_summary(&snapshot, 50.0);

        assert!(close(summary.monthly_total, 15.99 + 52.99));
        assert!(close(summary.yearly_total, (15.99 + 52.99) * 12.0));
        assert_eq!(summary.active, 2);
        assert_eq!(summary.paused, 1);
        assert_eq!(summary.cancelled, 0);
        assert!(summary.over_budget);
        assert!(summary.budget_used_percent > 100.0);
        assert_eq!(summary.by_category.len(), 2);
        assert!(!summary.is_multi_currency());
    }

    #[test]
    fn test_spending_summary_groups_by_currency() {
        let mut euro = spotify();
        euro.currency = "EUR".to_string();
        let snapshot = Snapshot::new(vec![netflix(), euro, adobe()]);

        let summary = spending_summary(&snapshot, DEFAULT_BUDGET_LIMIT);

        assert!(summary.is_multi_currency());
        assert_eq!(summary.by_currency.len(), 2);
        assert!(close(summary.by_currency["USD"], 15.99 + 52.99));
        assert!(close(summary.by_currency["EUR"], 9.99));
    }

    #[test]
    fn test_zero_budget_does_not_divide() {
        let summary = spending_summary(&Snapshot::default(), 0.0);
        assert_eq!(summary.budget_used_percent, 0.0);
        assert!(!summary.over_budget);
    }

    #[test]
    fn test_upcoming_renewals_window_and_order() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let mut soon = netflix();
        soon.next_billing_date = NaiveDate::from_ymd_opt(2024, 1, 15);
        let mut today_record = spotify();
        today_record.next_billing_date = Some(today);
        let mut far = adobe();
        far.next_billing_date = NaiveDate::from_ymd_opt(2024, 3, 1);

        let renewals = upcoming_renewals(&Snapshot::new(vec![soon, far, today_record]), today, 7);

        let names: Vec<&str> = renewals.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Spotify Premium", "Netflix"]);
        assert_eq!(renewals[0].days_until, 0);
        assert_eq!(renewals[1].days_until, 5);
    }
}
