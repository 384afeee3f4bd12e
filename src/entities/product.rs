//! Product entity - Membership fee products with a list price.
//!
//! A membership line references the product it bills, and the invoicing
//! wizard uses products as invoice line items.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name of the product (e.g., "Annual membership - SME")
    #[sea_orm(unique)]
    pub name: String,
    /// Public list price in the company currency
    pub list_price: f64,
    /// Membership type granted by this product
    pub membership_type_id: Option<i64>,
    /// Soft delete flag - if true, product is hidden but data is preserved
    pub is_deleted: bool,
    /// When the product was created
    pub created_at: DateTime,
    /// When the product was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Optional membership type
    #[sea_orm(
        belongs_to = "super::membership_type::Entity",
        from = "Column::MembershipTypeId",
        to = "super::membership_type::Column::Id"
    )]
    MembershipType,
}

impl Related<super::membership_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MembershipType.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
