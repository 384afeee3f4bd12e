/// Database configuration and connection management
pub mod database;

/// Reference data (membership types, stages, products) loading from config.toml
pub mod reference;
