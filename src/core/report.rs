//! Member report generation.
//!
//! This module gathers everything an operator wants to see about one partner
//! (stored membership fields, subscriptions, membership lines) and provides
//! the text formatting used by the bot layer. Functions return structured
//! data and stay framework-agnostic.

use crate::{
    core::{
        membership::check_valid_membership, membership_line, partner, stage, subscription,
    },
    entities::{membership_line as line_entity, partner as partner_entity, subscription as subscription_entity},
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;

/// One subscription as shown in a member report.
#[derive(Debug, Clone)]
pub struct SubscriptionSummary {
    /// The subscription
    pub subscription: subscription_entity::Model,
    /// Name of its current stage
    pub stage_name: String,
    /// Whether it currently grants membership
    pub valid: bool,
}

/// Everything known about a partner's membership.
#[derive(Debug, Clone)]
pub struct MemberReport {
    /// The partner being reported on
    pub partner: partner_entity::Model,
    /// Latest subscription is an individual membership
    pub individual_member: bool,
    /// Number of subscriptions owned by the partner
    pub total_membership: u64,
    /// Subscriptions of the partner and its company, most recent first
    pub subscriptions: Vec<SubscriptionSummary>,
    /// Membership lines of the partner, most recent period first
    pub lines: Vec<line_entity::Model>,
}

/// Generates a member report for a partner.
///
/// # Arguments
/// * `db` - Database connection
/// * `partner_id` - ID of the partner to report on
/// * `subscription_limit` - Maximum number of subscriptions to include (default 10)
pub async fn generate_member_report(
    db: &DatabaseConnection,
    partner_id: i64,
    subscription_limit: Option<u64>,
) -> Result<MemberReport> {
    let member = partner::require_partner(db, partner_id).await?;

    let limit = usize::try_from(subscription_limit.unwrap_or(10)).unwrap_or(usize::MAX);
    let mut subscriptions = Vec::new();
    for found in subscription::get_subscriptions_for_partner_tree(db, partner_id)
        .await?
        .into_iter()
        .take(limit)
    {
        let current = stage::require_stage(db, found.stage_id).await?;
        subscriptions.push(SubscriptionSummary {
            valid: found.active && check_valid_membership(found.is_membership, Some(current.category)),
            stage_name: current.name,
            subscription: found,
        });
    }

    Ok(MemberReport {
        individual_member: partner::individual_member(db, partner_id).await?,
        total_membership: partner::total_membership(db, partner_id).await?,
        lines: membership_line::get_lines_for_partner(db, partner_id).await?,
        subscriptions,
        partner: member,
    })
}

/// Formats a membership period, with open ends shown as `…`.
#[must_use]
pub fn format_period(from: Option<NaiveDate>, to: Option<NaiveDate>) -> String {
    let show = |date: Option<NaiveDate>| date.map_or_else(|| "…".to_string(), |d| d.to_string());
    format!("{} → {}", show(from), show(to))
}

/// Formats a fee with two decimals.
#[must_use]
pub fn format_price(amount: f64) -> String {
    format!("{amount:.2}")
}

/// One-line member status, e.g. `✅ Member (Corporate)`.
#[must_use]
pub fn format_member_status(member: &partner_entity::Model) -> String {
    if !member.is_member {
        return "❌ Not a member".to_string();
    }
    match &member.membership_type {
        Some(kind) => format!("✅ Member ({kind})"),
        None => "✅ Member".to_string(),
    }
}

/// Generates a summary line for a subscription.
#[must_use]
pub fn format_subscription_summary(summary: &SubscriptionSummary) -> String {
    let marker = if summary.valid { "✅" } else { "▫️" };
    let sub = &summary.subscription;
    format!(
        "{marker} {} | {} | {}",
        sub.name,
        summary.stage_name,
        format_period(Some(sub.date_start), sub.date)
    )
}

/// Generates a summary line for a membership line.
#[must_use]
pub fn format_line_summary(line: &line_entity::Model) -> String {
    format!(
        "#{} | {} | {} | {}",
        line.id,
        format_period(Some(line.date_from), Some(line.date_to)),
        line.state,
        format_price(line.member_price)
    )
}
