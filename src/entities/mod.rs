//! Entity module - Contains the SeaORM entity definitions for the database.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod subscription;

// Aliased so the entity does not clash with the domain `Subscription` record
pub use subscription::{
    Column as SubscriptionColumn, Entity as SubscriptionEntity, Model as SubscriptionModel,
};
