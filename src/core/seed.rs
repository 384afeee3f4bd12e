//! Reference data seeding from config.toml.
//!
//! Missing membership types, stages and products are inserted by name.
//! Existing rows are left alone, except soft-deleted products which are
//! re-enabled with the configured price.

use crate::{
    config::reference::Config,
    core::{membership_type, product, stage},
    entities::{Product, product as product_entity},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Set, TransactionTrait, prelude::*};
use tracing::{debug, info, instrument, warn};

/// Number of rows inserted or re-enabled per kind.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    /// Membership types inserted
    pub membership_types: usize,
    /// Stages inserted
    pub stages: usize,
    /// Products inserted or re-enabled
    pub products: usize,
}

/// Inserts the reference data listed in `config` that the database lacks.
///
/// # Errors
/// Returns `Error::Config` when a product names an unknown membership type.
#[instrument(skip(db, config))]
pub async fn seed_reference_data(db: &DatabaseConnection, config: &Config) -> Result<SeedSummary> {
    info!(
        "Seeding reference data: {} membership types, {} stages, {} products",
        config.membership_types.len(),
        config.stages.len(),
        config.products.len()
    );
    let txn = db.begin().await?;
    let mut summary = SeedSummary::default();

    for cfg_type in &config.membership_types {
        if membership_type::get_membership_type_by_name(&txn, &cfg_type.name)
            .await?
            .is_some()
        {
            debug!("Membership type '{}' already exists", cfg_type.name);
            continue;
        }
        membership_type::create_membership_type(&txn, &cfg_type.name, cfg_type.description.clone())
            .await?;
        summary.membership_types += 1;
    }

    for cfg_stage in &config.stages {
        if stage::get_stage_by_name(&txn, &cfg_stage.name).await?.is_some() {
            debug!("Stage '{}' already exists", cfg_stage.name);
            continue;
        }
        stage::create_stage(&txn, &cfg_stage.name, cfg_stage.category, cfg_stage.sequence).await?;
        summary.stages += 1;
    }

    for cfg_product in &config.products {
        let membership_type_id = match &cfg_product.membership_type {
            Some(type_name) => Some(
                membership_type::get_membership_type_by_name(&txn, type_name)
                    .await?
                    .ok_or_else(|| Error::Config {
                        message: format!(
                            "Product '{}' refers to unknown membership type '{type_name}'",
                            cfg_product.name
                        ),
                    })?
                    .id,
            ),
            None => None,
        };

        let existing = Product::find()
            .filter(product_entity::Column::Name.eq(cfg_product.name.as_str()))
            .one(&txn)
            .await?;
        match existing {
            Some(found) if !found.is_deleted => {
                debug!("Product '{}' already exists", cfg_product.name);
            }
            Some(found) => {
                warn!("Re-enabling soft-deleted product '{}'", cfg_product.name);
                let mut model: product_entity::ActiveModel = found.into();
                model.is_deleted = Set(false);
                model.list_price = Set(cfg_product.list_price);
                model.membership_type_id = Set(membership_type_id);
                model.updated_at = Set(Utc::now().naive_utc());
                model.update(&txn).await?;
                summary.products += 1;
            }
            None => {
                product::create_product(
                    &txn,
                    &cfg_product.name,
                    cfg_product.list_price,
                    membership_type_id,
                )
                .await?;
                summary.products += 1;
            }
        }
    }

    txn.commit().await?;
    info!("Reference data seeded: {summary:?}");
    Ok(summary)
}
