//! Shared test utilities for `MembershipBuddy`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test partners, stages and subscriptions with sensible defaults.

use crate::{
    core::{
        membership_type,
        partner::{self, NewPartner},
        product, stage,
        subscription::{self, NewSubscription},
    },
    entities,
    entities::subscription_stage::StageCategory,
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// The three stage categories, one stage each.
#[derive(Debug, Clone)]
pub struct TestStages {
    /// `draft` stage
    pub draft: entities::subscription_stage::Model,
    /// `progress` stage
    pub progress: entities::subscription_stage::Model,
    /// `closed` stage
    pub closed: entities::subscription_stage::Model,
}

/// Creates the stages "New", "In progress" and "Closed".
pub async fn create_test_stages(db: &DatabaseConnection) -> Result<TestStages> {
    Ok(TestStages {
        draft: stage::create_stage(db, "New", StageCategory::Draft, 1).await?,
        progress: stage::create_stage(db, "In progress", StageCategory::Progress, 2).await?,
        closed: stage::create_stage(db, "Closed", StageCategory::Closed, 3).await?,
    })
}

/// Creates a test product with sensible defaults.
///
/// # Defaults
/// * `list_price`: 300.0
/// * `membership_type_id`: None
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::product::Model> {
    product::create_product(db, name, 300.0, None).await
}

/// Creates a contact person working for `parent_id`.
pub async fn create_test_contact(
    db: &DatabaseConnection,
    name: &str,
    parent_id: i64,
) -> Result<entities::partner::Model> {
    partner::create_partner(db, NewPartner::contact(name, parent_id)).await
}

/// Reads a partner back from the database.
pub async fn reload_partner(
    db: &DatabaseConnection,
    partner_id: i64,
) -> Result<entities::partner::Model> {
    partner::require_partner(db, partner_id).await
}

/// A company with three contacts and one membership subscription listing them.
pub struct MembershipEnv {
    /// Test database
    pub db: DatabaseConnection,
    /// Stages by category
    pub stages: TestStages,
    /// Subscribing company
    pub company: entities::partner::Model,
    /// Contacts of the company, in creation order
    pub contacts: Vec<entities::partner::Model>,
    /// Membership subscription of the company, in the draft stage
    pub subscription: entities::subscription::Model,
}

/// Sets up a complete membership scenario.
///
/// # Defaults
/// * subscription: `all_members`, type "Complex", 2021-01-01 → 2021-12-31, draft stage
/// * contacts: "Alice", "Bob" and "Carol", all listed on the subscription
pub async fn setup_membership_env() -> Result<MembershipEnv> {
    let db = setup_test_db().await?;
    let stages = create_test_stages(&db).await?;
    let complex = membership_type::create_membership_type(&db, "Complex", None).await?;

    let company = partner::create_partner(&db, NewPartner::company("Acme Industries")).await?;
    let mut contacts = Vec::new();
    for name in ["Alice", "Bob", "Carol"] {
        contacts.push(create_test_contact(&db, name, company.id).await?);
    }

    let date_start = NaiveDate::from_ymd_opt(2021, 1, 1).ok_or_else(|| Error::Config {
        message: "invalid test date".to_string(),
    })?;
    let mut new = NewSubscription::membership("SUB-0001", company.id, stages.draft.id, date_start);
    new.all_members = true;
    new.membership_type_id = Some(complex.id);
    new.date = NaiveDate::from_ymd_opt(2021, 12, 31);
    new.contact_ids = Some(contacts.iter().map(|c| c.id).collect());
    let subscription = subscription::create_subscription(&db, new).await?;

    Ok(MembershipEnv {
        db,
        stages,
        company,
        contacts,
        subscription,
    })
}

/// Sets up a company with a postal address and a membership product.
/// Returns (db, company, product) for invoicing tests.
pub async fn setup_with_billable_company() -> Result<(
    DatabaseConnection,
    entities::partner::Model,
    entities::product::Model,
)> {
    let db = setup_test_db().await?;
    let company = partner::create_partner(
        &db,
        NewPartner::company("Billable SA").with_address("12 Rue du Port", "13002", "Marseille"),
    )
    .await?;
    let fee = create_test_product(&db, "Annual membership").await?;
    Ok((db, company, fee))
}
