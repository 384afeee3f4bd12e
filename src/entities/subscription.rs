//! Subscription entity - A recurring membership agreement for one partner.
//!
//! The contact allow-list lives in `subscription_contact`. Whether the
//! subscription grants membership depends on its stage category, see
//! `core::subscription::check_valid_membership`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Subscription database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscriptions")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Reference of the agreement
    pub name: String,
    /// Primary partner (usually a company)
    pub partner_id: i64,
    /// Current lifecycle stage
    pub stage_id: i64,
    /// Whether this subscription is a membership at all
    pub is_membership: bool,
    /// Whether this is an individual (non company) membership
    pub individual_member: bool,
    /// Whether every listed contact inherits member status
    pub all_members: bool,
    /// Membership type label
    pub membership_type_id: Option<i64>,
    /// First day covered
    pub date_start: Date,
    /// Last day covered, None for open-ended agreements
    pub date: Option<Date>,
    /// Archive flag
    pub active: bool,
    /// Last time the stage entered the `progress` category
    pub validated_at: Option<DateTimeUtc>,
    /// When the subscription was created
    pub created_at: DateTime,
    /// When the subscription was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between Subscription and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each subscription belongs to one partner
    #[sea_orm(
        belongs_to = "super::partner::Entity",
        from = "Column::PartnerId",
        to = "super::partner::Column::Id"
    )]
    Partner,
    /// Each subscription sits in one stage
    #[sea_orm(
        belongs_to = "super::subscription_stage::Entity",
        from = "Column::StageId",
        to = "super::subscription_stage::Column::Id"
    )]
    Stage,
    /// Optional membership type
    #[sea_orm(
        belongs_to = "super::membership_type::Entity",
        from = "Column::MembershipTypeId",
        to = "super::membership_type::Column::Id"
    )]
    MembershipType,
    /// Allow-listed contacts
    #[sea_orm(has_many = "super::subscription_contact::Entity")]
    Contacts,
}

impl Related<super::partner::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Partner.def()
    }
}

impl Related<super::subscription_stage::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Stage.def()
    }
}

impl Related<super::membership_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MembershipType.def()
    }
}

impl Related<super::subscription_contact::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contacts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
