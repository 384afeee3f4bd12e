//! Subscription stage lookups and creation.

use crate::{
    entities::{SubscriptionStage, subscription_stage},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Retrieves all stages ordered by their display sequence.
pub async fn get_all_stages<C>(db: &C) -> Result<Vec<subscription_stage::Model>>
where
    C: ConnectionTrait,
{
    SubscriptionStage::find()
        .order_by_asc(subscription_stage::Column::Sequence)
        .order_by_asc(subscription_stage::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a stage by its name.
pub async fn get_stage_by_name<C>(db: &C, name: &str) -> Result<Option<subscription_stage::Model>>
where
    C: ConnectionTrait,
{
    SubscriptionStage::find()
        .filter(subscription_stage::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a stage by id, failing when it does not exist.
pub async fn require_stage<C>(db: &C, stage_id: i64) -> Result<subscription_stage::Model>
where
    C: ConnectionTrait,
{
    SubscriptionStage::find_by_id(stage_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::StageNotFound {
            name: stage_id.to_string(),
        })
}

/// Creates a new stage. The name is trimmed and must not be empty.
pub async fn create_stage<C>(
    db: &C,
    name: &str,
    category: subscription_stage::StageCategory,
    sequence: i32,
) -> Result<subscription_stage::Model>
where
    C: ConnectionTrait,
{
    if name.trim().is_empty() {
        return Err(Error::Config {
            message: "Stage name cannot be empty".to_string(),
        });
    }

    subscription_stage::ActiveModel {
        name: Set(name.trim().to_string()),
        category: Set(category),
        sequence: Set(sequence),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}
