/// Application settings from config.toml
pub mod app;

/// Database configuration and connection management
pub mod database;

/// Seeding the store from configuration
pub mod seed;
