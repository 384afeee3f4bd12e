//! Membership line entity - One invoiced membership period of a partner.
//!
//! The `state` column follows the invoices linked to the line; see
//! `core::membership_line::compute_state` for the derivation.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Invoicing state of a membership line
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum LineState {
    /// Newly recorded
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Confirmed, a draft invoice exists or is expected
    #[sea_orm(string_value = "to_invoice")]
    ToInvoice,
    /// Invoice posted, waiting for payment
    #[sea_orm(string_value = "invoiced")]
    Invoiced,
    /// Invoice paid
    #[sea_orm(string_value = "paid")]
    Paid,
    /// Canceled or suspended
    #[sea_orm(string_value = "canceled")]
    Canceled,
}

impl std::fmt::Display for LineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::ToInvoice => write!(f, "to_invoice"),
            Self::Invoiced => write!(f, "invoiced"),
            Self::Paid => write!(f, "paid"),
            Self::Canceled => write!(f, "canceled"),
        }
    }
}

/// Membership line database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "membership_lines")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Optional designation
    pub name: Option<String>,
    /// Member company or contact
    pub partner_id: i64,
    /// Membership product billed by this line
    pub product_id: i64,
    /// Invoicing state
    pub state: LineState,
    /// First day of the period
    pub date_from: Date,
    /// Last day of the period
    pub date_to: Date,
    /// Day the line was canceled
    pub date_cancel: Option<Date>,
    /// Membership fee, copied from the product list price
    pub member_price: f64,
    /// Whether every listed contact is a member
    pub all_members: bool,
    /// When the line was created
    pub created_at: DateTime,
}

/// Defines relationships between `MembershipLine` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each line belongs to one partner
    #[sea_orm(
        belongs_to = "super::partner::Entity",
        from = "Column::PartnerId",
        to = "super::partner::Column::Id",
        on_delete = "Cascade"
    )]
    Partner,
    /// Each line bills one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    /// Invoices issued for this line
    #[sea_orm(has_many = "super::invoice::Entity")]
    Invoices,
}

impl Related<super::partner::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Partner.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
