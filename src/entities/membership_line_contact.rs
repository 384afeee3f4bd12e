//! Membership line contact entity - Contacts covered by a membership line.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One contact listed on a membership line
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "membership_line_contacts")]
pub struct Model {
    /// Membership line the contact is listed on
    #[sea_orm(primary_key, auto_increment = false)]
    pub membership_line_id: i64,
    /// Listed contact
    #[sea_orm(primary_key, auto_increment = false)]
    pub partner_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::membership_line::Entity",
        from = "Column::MembershipLineId",
        to = "super::membership_line::Column::Id",
        on_delete = "Cascade"
    )]
    MembershipLine,
}

impl Related<super::membership_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MembershipLine.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
