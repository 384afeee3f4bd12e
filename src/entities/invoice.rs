//! Invoice entity - Customer invoices issued for membership fees.
//!
//! Posting and payment are owned by accounting; this crate only reads
//! `state` and `payment_state` to derive membership line states.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Posting state of an invoice
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum InvoiceState {
    /// Not posted yet
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Posted to the ledger
    #[sea_orm(string_value = "posted")]
    Posted,
    /// Canceled
    #[sea_orm(string_value = "cancel")]
    Cancel,
}

/// Payment state of an invoice
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    /// Nothing received
    #[sea_orm(string_value = "not_paid")]
    NotPaid,
    /// Payment registered, not yet reconciled
    #[sea_orm(string_value = "in_payment")]
    InPayment,
    /// Fully paid
    #[sea_orm(string_value = "paid")]
    Paid,
}

/// Invoice database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Invoiced partner
    pub partner_id: i64,
    /// Partner record holding the invoicing address
    pub invoice_address_id: i64,
    /// Membership line this invoice pays for
    pub membership_line_id: Option<i64>,
    /// Posting state
    pub state: InvoiceState,
    /// Payment state
    pub payment_state: PaymentState,
    /// Sum of the invoice lines
    pub amount_total: f64,
    /// When the invoice was created
    pub created_at: DateTime,
}

/// Defines relationships between Invoice and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Optional membership line
    #[sea_orm(
        belongs_to = "super::membership_line::Entity",
        from = "Column::MembershipLineId",
        to = "super::membership_line::Column::Id"
    )]
    MembershipLine,
    /// Invoice lines
    #[sea_orm(has_many = "super::invoice_line::Entity")]
    Lines,
}

impl Related<super::membership_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MembershipLine.def()
    }
}

impl Related<super::invoice_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
