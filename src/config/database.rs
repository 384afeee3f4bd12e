//! Database configuration module.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the database schema always matches the Rust structs without hand-written SQL.

use crate::entities::{
    Invoice, InvoiceLine, MembershipLine, MembershipLineContact, MembershipType, Partner,
    Product, Subscription, SubscriptionContact, SubscriptionStage,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::debug;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/membership_buddy.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to a local `SQLite` file if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    debug!("Connecting to database at {database_url}");
    Database::connect(&database_url).await.map_err(Into::into)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all tables from the entity definitions.
///
/// Parents are created before the tables that reference them. Existing tables are kept.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, Partner).await?;
    create_table(db, &schema, MembershipType).await?;
    create_table(db, &schema, SubscriptionStage).await?;
    create_table(db, &schema, Product).await?;
    create_table(db, &schema, Subscription).await?;
    create_table(db, &schema, SubscriptionContact).await?;
    create_table(db, &schema, MembershipLine).await?;
    create_table(db, &schema, MembershipLineContact).await?;
    create_table(db, &schema, Invoice).await?;
    create_table(db, &schema, InvoiceLine).await?;

    Ok(())
}
