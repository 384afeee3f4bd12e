//! Unified error type for the membership engine, its configuration and the bot layer.

use thiserror::Error;

/// Every failure the crate can surface.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration or invalid user input
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable reason
        message: String,
    },

    /// Failure reported by the database layer
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A price or amount that is negative or not finite
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// No partner matches the given name or id
    #[error("Partner not found: {name}")]
    PartnerNotFound {
        /// Name or id that was looked up
        name: String,
    },

    /// No subscription matches the given name or id
    #[error("Subscription not found: {name}")]
    SubscriptionNotFound {
        /// Name or id that was looked up
        name: String,
    },

    /// No subscription stage matches the given name or id
    #[error("Subscription stage not found: {name}")]
    StageNotFound {
        /// Name or id that was looked up
        name: String,
    },

    /// No product matches the given name or id
    #[error("Product not found: {name}")]
    ProductNotFound {
        /// Name or id that was looked up
        name: String,
    },

    /// No membership line with this id
    #[error("Membership line not found: {id}")]
    MembershipLineNotFound {
        /// Membership line id
        id: i64,
    },

    /// No invoice with this id
    #[error("Invoice not found: {id}")]
    InvoiceNotFound {
        /// Invoice id
        id: i64,
    },

    /// The partner has no address an invoice can be sent to
    #[error("Partner '{partner}' doesn't have an address to make the invoice.")]
    MissingInvoiceAddress {
        /// Name of the partner being invoiced
        partner: String,
    },

    /// The partner is not among those a membership line may be invoiced to
    #[error("Partner '{partner}' cannot be invoiced for membership line {line_id}")]
    IneligiblePartner {
        /// Name of the rejected partner
        partner: String,
        /// Membership line id
        line_id: i64,
    },

    /// Failure while formatting a reply
    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// I/O failure, typically while reading `config.toml`
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Serenity/Poise framework error
    #[error("Serenity/Poise framework error: {0}")]
    #[allow(clippy::enum_variant_names)]
    FrameworkError(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::FrameworkError(Box::new(value))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
