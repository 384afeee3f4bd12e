//! Membership type entity - Label attached to subscriptions and products.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Membership type database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "membership_types")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Type name shown on partners (e.g., "Corporate", "Individual")
    #[sea_orm(unique)]
    pub name: String,
    /// Free text description
    pub description: Option<String>,
}

/// Defines relationships between `MembershipType` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One type labels many subscriptions
    #[sea_orm(has_many = "super::subscription::Entity")]
    Subscriptions,
    /// One type labels many products
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
}

impl Related<super::subscription::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subscriptions.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
