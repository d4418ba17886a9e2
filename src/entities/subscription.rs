//! Subscription entity - One row per tracked recurring payment.
//!
//! Enum-like fields (`billing_cycle`, `status`) are stored as their lowercase names
//! and `tags` as a JSON array string, so the table stays portable across backends.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Subscription database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscriptions")]
pub struct Model {
    /// Client-generated identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Display name (e.g., "Netflix")
    pub name: String,
    /// Category (e.g., "Streaming")
    pub category: String,
    /// Price per billing cycle
    pub price: f64,
    /// ISO 4217 currency code
    pub currency: String,
    /// `"weekly"`, `"monthly"`, `"quarterly"` or `"yearly"`
    pub billing_cycle: String,
    /// Next charge date
    pub next_billing_date: Option<Date>,
    /// `"active"`, `"paused"` or `"cancelled"`
    pub status: String,
    /// JSON array of tags
    pub tags: String,
    /// Short description of the service
    pub description: Option<String>,
    /// Private notes
    pub notes: Option<String>,
    /// Service website
    pub website: Option<String>,
    /// Icon glyph
    pub icon: Option<String>,
    /// Brand color
    pub color: Option<String>,
    /// Logo image reference
    pub logo_url: Option<String>,
    /// When the row was created
    pub created_at: DateTimeUtc,
    /// When the row was last modified
    pub updated_at: DateTimeUtc,
    /// Owner of the record
    pub user_id: String,
}

/// Subscriptions have no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
