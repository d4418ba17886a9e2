//! Subscription records - the recurring payment obligations tracked by the dashboard.
//!
//! `Subscription` is the full record held in the local collection, `SubscriptionDraft`
//! is the input of a create, and `SubscriptionPatch` describes a partial update.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Opaque, immutable subscription identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(String);

impl SubscriptionId {
    /// Wraps an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random identifier for an optimistic create.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Borrows the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubscriptionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SubscriptionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Returned when a stored enum string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    /// Which enum was being parsed
    pub kind: &'static str,
    /// The rejected input
    pub value: String,
}

/// How often a subscription bills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    /// Every week
    Weekly,
    /// Every month
    Monthly,
    /// Every three months
    Quarterly,
    /// Every year
    Yearly,
}

impl BillingCycle {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }
}

impl fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingCycle {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "yearly" | "annual" | "annually" => Ok(Self::Yearly),
            _ => Err(UnknownVariant {
                kind: "billing cycle",
                value: s.to_string(),
            }),
        }
    }
}

/// Lifecycle status of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Billing normally
    Active,
    /// Temporarily not billing
    Paused,
    /// No longer billing
    Cancelled,
}

impl SubscriptionStatus {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(UnknownVariant {
                kind: "subscription status",
                value: s.to_string(),
            }),
        }
    }
}

/// One recurring payment obligation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    /// Unique identifier, never changes after creation
    pub id: SubscriptionId,
    /// Display name (e.g., "Netflix")
    pub name: String,
    /// Free-form category (e.g., "Streaming")
    pub category: String,
    /// Price per billing cycle, never negative
    pub price: f64,
    /// ISO 4217 currency code
    pub currency: String,
    /// How often the price is charged
    pub billing_cycle: BillingCycle,
    /// Next charge date; required while active
    pub next_billing_date: Option<NaiveDate>,
    /// Lifecycle status
    pub status: SubscriptionStatus,
    /// User-assigned tags
    pub tags: BTreeSet<String>,
    /// Short description of the service
    pub description: Option<String>,
    /// Private notes
    pub notes: Option<String>,
    /// Service website
    pub website: Option<String>,
    /// Icon glyph shown in lists
    pub icon: Option<String>,
    /// Brand color as `#RRGGBB`
    pub color: Option<String>,
    /// Logo image reference
    pub logo_url: Option<String>,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// When the record was last modified
    pub updated_at: DateTime<Utc>,
    /// Owner of the record
    pub user_id: String,
}

impl Subscription {
    /// Returns a copy with every field set in `patch` replaced and `updated_at` bumped.
    /// Text fields are normalized as on create. The identifier and creation
    /// timestamp are never touched.
    #[must_use]
    pub fn apply_patch(&self, patch: &SubscriptionPatch, now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        if let Some(name) = &patch.name {
            next.name = name.trim().to_string();
        }
        if let Some(category) = &patch.category {
            next.category = category.trim().to_string();
        }
        if let Some(price) = patch.price {
            next.price = price;
        }
        if let Some(currency) = &patch.currency {
            next.currency = currency.trim().to_uppercase();
        }
        if let Some(cycle) = patch.billing_cycle {
            next.billing_cycle = cycle;
        }
        if let Some(date) = patch.next_billing_date {
            next.next_billing_date = date;
        }
        if let Some(status) = patch.status {
            next.status = status;
        }
        if let Some(tags) = &patch.tags {
            next.tags.clone_from(tags);
        }
        if let Some(description) = &patch.description {
            next.description.clone_from(description);
        }
        if let Some(notes) = &patch.notes {
            next.notes.clone_from(notes);
        }
        if let Some(website) = &patch.website {
            next.website.clone_from(website);
        }
        if let Some(icon) = &patch.icon {
            next.icon.clone_from(icon);
        }
        if let Some(color) = &patch.color {
            next.color.clone_from(color);
        }
        if let Some(logo_url) = &patch.logo_url {
            next.logo_url.clone_from(logo_url);
        }
        next.updated_at = now;
        next
    }
}

/// Input of a create: everything except the identifier and audit timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionDraft {
    /// Display name
    pub name: String,
    /// Free-form category
    pub category: String,
    /// Price per billing cycle
    pub price: f64,
    /// ISO 4217 currency code
    pub currency: String,
    /// Billing frequency
    pub billing_cycle: BillingCycle,
    /// Next charge date
    #[serde(default)]
    pub next_billing_date: Option<NaiveDate>,
    /// Lifecycle status
    pub status: SubscriptionStatus,
    /// User-assigned tags
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Short description
    #[serde(default)]
    pub description: Option<String>,
    /// Private notes
    #[serde(default)]
    pub notes: Option<String>,
    /// Service website
    #[serde(default)]
    pub website: Option<String>,
    /// Icon glyph
    #[serde(default)]
    pub icon: Option<String>,
    /// Brand color
    #[serde(default)]
    pub color: Option<String>,
    /// Logo image reference
    #[serde(default)]
    pub logo_url: Option<String>,
    /// Owner of the record
    pub user_id: String,
}

impl SubscriptionDraft {
    /// Materializes the draft into a record with the given identifier.
    #[must_use]
    pub fn into_subscription(self, id: SubscriptionId, now: DateTime<Utc>) -> Subscription {
        Subscription {
            id,
            name: self.name.trim().to_string(),
            category: self.category.trim().to_string(),
            price: self.price,
            currency: self.currency.trim().to_uppercase(),
            billing_cycle: self.billing_cycle,
            next_billing_date: self.next_billing_date,
            status: self.status,
            tags: self.tags,
            description: self.description,
            notes: self.notes,
            website: self.website,
            icon: self.icon,
            color: self.color,
            logo_url: self.logo_url,
            created_at: now,
            updated_at: now,
            user_id: self.user_id,
        }
    }
}

/// Partial update. `None` leaves a field unchanged; for optional fields
/// `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubscriptionPatch {
    /// New display name
    pub name: Option<String>,
    /// New category
    pub category: Option<String>,
    /// New price
    pub price: Option<f64>,
    /// New currency code
    pub currency: Option<String>,
    /// New billing cycle
    pub billing_cycle: Option<BillingCycle>,
    /// New next billing date
    pub next_billing_date: Option<Option<NaiveDate>>,
    /// New status
    pub status: Option<SubscriptionStatus>,
    /// Replacement tag set
    pub tags: Option<BTreeSet<String>>,
    /// New description
    pub description: Option<Option<String>>,
    /// New notes
    pub notes: Option<Option<String>>,
    /// New website
    pub website: Option<Option<String>>,
    /// New icon glyph
    pub icon: Option<Option<String>>,
    /// New brand color
    pub color: Option<Option<String>>,
    /// New logo reference
    pub logo_url: Option<Option<String>>,
}

impl SubscriptionPatch {
    /// Patch that only changes the price.
    #[must_use]
    pub fn price(price: f64) -> Self {
        Self {
            price: Some(price),
            ..Self::default()
        }
    }

    /// Patch that only changes the status.
    #[must_use]
    pub fn status(status: SubscriptionStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// True when the patch would change nothing but `updated_at`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::netflix;

    #[test]
    fn test_enum_round_trip_through_strings() {
        for cycle in [
            BillingCycle::Weekly,
            BillingCycle::Monthly,
            BillingCycle::Quarterly,
            BillingCycle::Yearly,
        ] {
            assert_eq!(cycle.as_str().parse::<BillingCycle>().unwrap(), cycle);
        }
        assert_eq!(
            "Canceled".parse::<SubscriptionStatus>().unwrap(),
            SubscriptionStatus::Cancelled
        );
        let err = "fortnightly".parse::<BillingCycle>().unwrap_err();
        assert_eq!(err.value, "fortnightly");
    }

    #[test]
    fn test_apply_patch_keeps_identity_and_bumps_updated_at() {
        let original = netflix();
        let later = original.updated_at + chrono::Duration::days(1);
        let patch = SubscriptionPatch {
            price: Some(16.99),
            notes: Some(None),
            ..SubscriptionPatch::default()
        };

        let patched = original.apply_patch(&patch, later);

        assert_eq!(patched.id, original.id);
        assert_eq!(patched.created_at, original.created_at);
        assert_eq!(patched.updated_at, later);
        assert_eq!(patched.price, 16.99);
        assert_eq!(patched.notes, None);
        assert_eq!(patched.name, original.name);
        assert_eq!(original.price, 15.99);
    }

    #[test]
    fn test_apply_patch_normalizes_text_like_a_draft() {
        let patch = SubscriptionPatch {
            name: Some("  Netflix Premium ".to_string()),
            category: Some(" Video ".to_string()),
            currency: Some("eur".to_string()),
            ..SubscriptionPatch::default()
        };

        let patched = netflix().apply_patch(&patch, netflix().updated_at);

        assert_eq!(patched.name, "Netflix Premium");
        assert_eq!(patched.category, "Video");
        assert_eq!(patched.currency, "EUR");
    }

    #[test]
    fn test_draft_normalizes_name_and_currency() {
        let draft = SubscriptionDraft {
            name: "  Hulu ".to_string(),
            category: "Streaming".to_string(),
            price: 7.99,
            currency: "usd".to_string(),
            billing_cycle: BillingCycle::Monthly,
            next_billing_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            status: SubscriptionStatus::Active,
            tags: BTreeSet::new(),
            description: None,
            notes: None,
            website: None,
            icon: None,
            color: None,
            logo_url: None,
            user_id: "user-123".to_string(),
        };
        let now = Utc::now();
        let record = draft.into_subscription(SubscriptionId::new("h1"), now);
        assert_eq!(record.name, "Hulu");
        assert_eq!(record.currency, "USD");
        assert_eq!(record.created_at, now);
    }

    #[test]
    fn test_empty_patch() {
        assert!(SubscriptionPatch::default().is_empty());
        assert!(!SubscriptionPatch::price(1.0).is_empty());
    }
}
