//! Field-level validation for subscription input.
//!
//! Validators are pure functions that collect every violated field instead of stopping
//! at the first one, so the caller can report them all at once.

use super::subscription::{Subscription, SubscriptionDraft, SubscriptionPatch, SubscriptionStatus};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// Currency codes accepted for new and updated records.
pub const SUPPORTED_CURRENCIES: &[&str] = &[
    "USD", "EUR", "GBP", "JPY", "CAD", "AUD", "CHF", "CNY", "INR", "SEK", "NOK", "DKK", "NZD",
    "MXN", "BRL", "ZAR", "SGD", "HKD", "KRW", "PLN",
];

const MAX_NAME_LEN: usize = 100;
const MAX_NOTES_LEN: usize = 1000;
const MAX_PRICE: f64 = 1_000_000.0;

/// A single violated field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Name of the offending field
    pub field: String,
    /// Human-readable reason
    pub message: String,
}

impl FieldError {
    /// Creates a field error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// True when `code` is one of [`SUPPORTED_CURRENCIES`] (case-insensitive).
#[must_use]
pub fn is_supported_currency(code: &str) -> bool {
    let upper = code.trim().to_uppercase();
    SUPPORTED_CURRENCIES.contains(&upper.as_str())
}

/// Validates the input of a create.
#[must_use]
pub fn validate_draft(draft: &SubscriptionDraft) -> Vec<FieldError> {
    let mut errors = Vec::new();
    check_name(&draft.name, &mut errors);
    check_category(&draft.category, &mut errors);
    check_price(draft.price, &mut errors);
    check_currency(&draft.currency, &mut errors);
    check_billing_date(draft.status, draft.next_billing_date, &mut errors);
    check_metadata(
        draft.website.as_deref(),
        draft.color.as_deref(),
        draft.notes.as_deref(),
        &mut errors,
    );
    if draft.user_id.trim().is_empty() {
        errors.push(FieldError::new("user_id", "is required"));
    }
    errors
}

/// Validates the fields a patch sets, without looking at the record it targets.
#[must_use]
pub fn validate_patch(patch: &SubscriptionPatch) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if let Some(name) = &patch.name {
        check_name(name, &mut errors);
    }
    if let Some(category) = &patch.category {
        check_category(category, &mut errors);
    }
    if let Some(price) = patch.price {
        check_price(price, &mut errors);
    }
    if let Some(currency) = &patch.currency {
        check_currency(currency, &mut errors);
    }
    check_metadata(
        patch.website.as_ref().and_then(Option::as_deref),
        patch.color.as_ref().and_then(Option::as_deref),
        patch.notes.as_ref().and_then(Option::as_deref),
        &mut errors,
    );
    errors
}

/// Validates a complete record, e.g. the result of applying a patch.
#[must_use]
pub fn validate_record(record: &Subscription) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if record.id.as_str().trim().is_empty() {
        errors.push(FieldError::new("id", "is required"));
    }
    check_name(&record.name, &mut errors);
    check_category(&record.category, &mut errors);
    check_price(record.price, &mut errors);
    check_currency(&record.currency, &mut errors);
    check_billing_date(record.status, record.next_billing_date, &mut errors);
    check_metadata(
        record.website.as_deref(),
        record.color.as_deref(),
        record.notes.as_deref(),
        &mut errors,
    );
    errors
}

fn check_name(name: &str, errors: &mut Vec<FieldError>) {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        errors.push(FieldError::new("name", "is required"));
    } else if trimmed.chars().count() > MAX_NAME_LEN {
        errors.push(FieldError::new(
            "name",
            format!("must be at most {MAX_NAME_LEN} characters"),
        ));
    }
}

fn check_category(category: &str, errors: &mut Vec<FieldError>) {
    if category.trim().is_empty() {
        errors.push(FieldError::new("category", "is required"));
    }
}

fn check_price(price: f64, errors: &mut Vec<FieldError>) {
    if !price.is_finite() {
        errors.push(FieldError::new("price", "must be a number"));
    } else if price < 0.0 {
        errors.push(FieldError::new("price", "must not be negative"));
    } else if price > MAX_PRICE {
        errors.push(FieldError::new("price", "is unrealistically large"));
    }
}

fn check_currency(currency: &str, errors: &mut Vec<FieldError>) {
    if !is_supported_currency(currency) {
        errors.push(FieldError::new(
            "currency",
            format!("'{currency}' is not a recognized currency code"),
        ));
    }
}

fn check_billing_date(
    status: SubscriptionStatus,
    date: Option<NaiveDate>,
    errors: &mut Vec<FieldError>,
) {
    if status == SubscriptionStatus::Active && date.is_none() {
        errors.push(FieldError::new(
            "next_billing_date",
            "is required for active subscriptions",
        ));
    }
}

fn check_metadata(
    website: Option<&str>,
    color: Option<&str>,
    notes: Option<&str>,
    errors: &mut Vec<FieldError>,
) {
    if let Some(website) = website {
        let website = website.trim();
        let has_scheme = website.starts_with("https://") || website.starts_with("http://");
        if !website.is_empty() && (!has_scheme || website.contains(char::is_whitespace)) {
            errors.push(FieldError::new("website", "must be an http(s) URL"));
        }
    }
    if let Some(color) = color {
        let hex = color.strip_prefix('#').unwrap_or("");
        let valid = matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit());
        if !valid {
            errors.push(FieldError::new("color", "must be a hex color like #E50914"));
        }
    }
    if notes.is_some_and(|notes| notes.chars().count() > MAX_NOTES_LEN) {
        errors.push(FieldError::new(
            "notes",
            format!("must be at most {MAX_NOTES_LEN} characters"),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{netflix, sample_draft};

    fn fields(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn test_valid_draft_has_no_errors() {
        assert!(validate_draft(&sample_draft("Hulu")).is_empty());
        assert!(validate_record(&netflix()).is_empty());
    }

    #[test]
    fn test_every_violation_is_reported() {
        let mut draft = sample_draft("  ");
        draft.category = String::new();
        draft.price = -1.0;
        draft.currency = "XYZ".to_string();
        draft.next_billing_date = None;
        draft.website = Some("netflix.com".to_string());
        draft.color = Some("red".to_string());

        let errors = validate_draft(&draft);

        assert_eq!(
            fields(&errors),
            vec![
                "name",
                "category",
                "price",
                "currency",
                "next_billing_date",
                "website",
                "color"
            ]
        );
    }

    #[test]
    fn test_non_finite_price_is_rejected() {
        let mut draft = sample_draft("Hulu");
        draft.price = f64::NAN;
        assert_eq!(fields(&validate_draft(&draft)), vec!["price"]);
    }

    #[test]
    fn test_paused_subscription_needs_no_billing_date() {
        let mut draft = sample_draft("Hulu");
        draft.status = SubscriptionStatus::Paused;
        draft.next_billing_date = None;
        assert!(validate_draft(&draft).is_empty());
    }

    #[test]
    fn test_patch_only_checks_set_fields() {
        assert!(validate_patch(&SubscriptionPatch::default()).is_empty());
        assert!(validate_patch(&SubscriptionPatch::price(0.0)).is_empty());
        assert_eq!(
            fields(&validate_patch(&SubscriptionPatch::price(-3.0))),
            vec!["price"]
        );

        let clear_website = SubscriptionPatch {
            website: Some(None),
            currency: Some("eur".to_string()),
            ..SubscriptionPatch::default()
        };
        assert!(validate_patch(&clear_website).is_empty());
    }

    #[test]
    fn test_currency_lookup_is_case_insensitive() {
        assert!(is_supported_currency("usd"));
        assert!(is_supported_currency(" GBP "));
        assert!(!is_supported_currency("BTC"));
    }
}
