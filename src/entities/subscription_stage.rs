//! Subscription stage entity - Lifecycle marker of a subscription.
//!
//! Only the stage category matters to the membership rules: a membership
//! subscription counts while its stage is in the `progress` category.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle category of a stage
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum StageCategory {
    /// Not yet running
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Running, the only category granting membership
    #[sea_orm(string_value = "progress")]
    Progress,
    /// Finished or closed
    #[sea_orm(string_value = "closed")]
    Closed,
}

impl std::fmt::Display for StageCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Progress => write!(f, "progress"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Subscription stage database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscription_stages")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Stage label (e.g., "New", "Paid", "Closed")
    #[sea_orm(unique)]
    pub name: String,
    /// Lifecycle category driving membership validity
    pub category: StageCategory,
    /// Display order
    pub sequence: i32,
}

/// Defines relationships between `SubscriptionStage` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One stage holds many subscriptions
    #[sea_orm(has_many = "super::subscription::Entity")]
    Subscriptions,
}

impl Related<super::subscription::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subscriptions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
