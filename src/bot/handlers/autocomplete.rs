//! Autocomplete handlers for Discord slash command parameters.
//!
//! This module provides autocomplete functionality for command parameters like
//! partner, product, stage and subscription names, improving the user
//! experience by suggesting valid options as the user types.

use crate::{
    bot::BotData,
    core::{partner, product, stage},
    entities::Subscription,
    errors::Error,
};
use sea_orm::{EntityTrait, QueryOrder};

/// Discord autocomplete limit
const MAX_SUGGESTIONS: usize = 25;

/// Keeps the names containing `partial` (case-insensitive), sorted, at most 25.
fn matching_names(names: impl IntoIterator<Item = String>, partial: &str) -> Vec<String> {
    let partial_lower = partial.to_lowercase();
    let mut matching: Vec<String> = names
        .into_iter()
        .filter(|name| name.to_lowercase().contains(&partial_lower))
        .take(MAX_SUGGESTIONS)
        .collect();

    // Sort alphabetically for consistent UX
    matching.sort();
    matching
}

/// Provides autocomplete suggestions for partner names.
///
/// Companies and contacts are both suggested, up to 25 matches.
pub async fn autocomplete_partner_name(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let db = &ctx.data().database;
    let Ok(partners) = partner::get_all_partners(db).await else {
        return Vec::new();
    };
    matching_names(partners.into_iter().map(|p| p.name), partial)
}

/// Provides autocomplete suggestions for product names.
///
/// Returns just the name so it matches command parameters exactly.
pub async fn autocomplete_product_name(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let db = &ctx.data().database;
    let Ok(products) = product::get_all_active_products(db).await else {
        return Vec::new();
    };
    matching_names(products.into_iter().map(|p| p.name), partial)
}

/// Provides autocomplete suggestions for subscription stage names.
pub async fn autocomplete_stage_name(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let db = &ctx.data().database;
    let Ok(stages) = stage::get_all_stages(db).await else {
        return Vec::new();
    };
    matching_names(stages.into_iter().map(|s| s.name), partial)
}

/// Provides autocomplete suggestions for subscription references.
pub async fn autocomplete_subscription_name(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let db = &ctx.data().database;
    let Ok(subscriptions) = Subscription::find()
        .order_by_desc(crate::entities::SubscriptionColumn::Id)
        .all(db)
        .await
    else {
        return Vec::new();
    };
    matching_names(subscriptions.into_iter().map(|s| s.name), partial)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_names_filters_case_insensitively() {
        let names = ["Acme Industries", "Bob", "acme staff"].map(String::from);
        assert_eq!(
            matching_names(names, "ACME"),
            vec!["Acme Industries".to_string(), "acme staff".to_string()]
        );
    }

    #[test]
    fn test_matching_names_caps_at_discord_limit() {
        let names = (0..40).map(|i| format!("Partner {i:02}"));
        let matching = matching_names(names, "");
        assert_eq!(matching.len(), MAX_SUGGESTIONS);
        assert_eq!(matching[0], "Partner 00");
    }
}
