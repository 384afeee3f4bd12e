//! Reference data loading from config.toml
//!
//! The membership types, subscription stages and membership products listed in
//! config.toml are used to seed the database on first run or when some of them
//! are missing. See `core::seed_reference_data`.

use crate::entities::subscription_stage::StageCategory;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Membership types to seed
    #[serde(default)]
    pub membership_types: Vec<MembershipTypeConfig>,
    /// Subscription stages to seed
    #[serde(default)]
    pub stages: Vec<StageConfig>,
    /// Membership products to seed
    #[serde(default)]
    pub products: Vec<ProductConfig>,
}

/// Configuration for a single membership type
#[derive(Debug, Deserialize, Clone)]
pub struct MembershipTypeConfig {
    /// Unique type name
    pub name: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
}

/// Configuration for a single subscription stage
#[derive(Debug, Deserialize, Clone)]
pub struct StageConfig {
    /// Unique stage name
    pub name: String,
    /// Lifecycle category (`draft`, `progress` or `closed`)
    pub category: StageCategory,
    /// Display order
    #[serde(default)]
    pub sequence: i32,
}

/// Configuration for a single membership product
#[derive(Debug, Deserialize, Clone)]
pub struct ProductConfig {
    /// Unique product name
    pub name: String,
    /// Public list price
    pub list_price: f64,
    /// Name of the membership type granted by the product
    #[serde(default)]
    pub membership_type: Option<String>,
}

/// Loads reference data configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing or a stage category is unknown
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads the configuration from `CONFIG_PATH`, or ./config.toml when unset
pub fn load_default_config() -> Result<Config> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_config(path)
}
