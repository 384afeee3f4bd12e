//! Partner entity - A company or an individual contact.
//!
//! Companies own their staff contacts through `parent_id`. The membership
//! columns (`is_member`, `date_first_start`, `date_last_stop`,
//! `membership_type`) are written only by the rules in `core::partner` and
//! `core::subscription`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role of a partner record inside its company
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum AddressType {
    /// Regular contact
    #[sea_orm(string_value = "contact")]
    Contact,
    /// Address invoices are sent to
    #[sea_orm(string_value = "invoice")]
    Invoice,
    /// Delivery address
    #[sea_orm(string_value = "delivery")]
    Delivery,
}

/// Partner database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "partners")]
pub struct Model {
    /// Unique identifier for the partner
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (company name or person name)
    pub name: String,
    /// Owning company, None for top-level partners
    pub parent_id: Option<i64>,
    /// Whether this partner is a company rather than a person
    pub is_company: bool,
    /// Role of this record inside its company
    pub address_type: AddressType,
    /// Street line of the postal address
    pub street: Option<String>,
    /// Postal code
    pub zip: Option<String>,
    /// City
    pub city: Option<String>,
    /// Set when a valid membership covers this partner
    pub is_member: bool,
    /// Start of the first valid membership
    pub date_first_start: Option<Date>,
    /// End of the last valid membership
    pub date_last_stop: Option<Date>,
    /// Name of the current membership type
    pub membership_type: Option<String>,
    /// When the partner was created
    pub created_at: DateTime,
    /// When the partner was last modified
    pub updated_at: DateTime,
}

impl Model {
    /// Whether a postal address has been filled in.
    #[must_use]
    pub fn has_postal_address(&self) -> bool {
        let filled = |field: &Option<String>| field.as_deref().is_some_and(|v| !v.trim().is_empty());
        filled(&self.street) || filled(&self.city)
    }
}

/// Defines relationships between Partner and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One partner owns many subscriptions
    #[sea_orm(has_many = "super::subscription::Entity")]
    Subscriptions,
    /// One partner has many membership lines
    #[sea_orm(has_many = "super::membership_line::Entity")]
    MembershipLines,
}

impl Related<super::subscription::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subscriptions.def()
    }
}

impl Related<super::membership_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MembershipLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
