//! Subscription Discord commands - `subscriptions` and `subscription_stage`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::autocomplete},
        core::{partner, report, stage, subscription},
        errors::{Error, Result},
    };
    use std::fmt::Write as _;

    /// Lists the subscriptions of a partner and of its contacts.
    #[poise::command(slash_command)]
    pub async fn subscriptions(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Company or contact"]
        #[autocomplete = "autocomplete::autocomplete_partner_name"]
        partner_name: String,
    ) -> Result<()> {
        let db = &ctx.data().database;

        let Some(found) = partner::get_partner_by_name(db, &partner_name).await? else {
            ctx.say(format!("❌ No partner named '{partner_name}'.")).await?;
            return Ok(());
        };

        let member = report::generate_member_report(db, found.id, Some(25)).await?;
        if member.subscriptions.is_empty() {
            ctx.say(format!("{} has no subscriptions.", found.name)).await?;
            return Ok(());
        }

        let mut text = format!("**Subscriptions of {}**\n", found.name);
        for summary in &member.subscriptions {
            writeln!(text, "• {}", report::format_subscription_summary(summary))?;
        }
        ctx.say(text).await?;
        Ok(())
    }

    /// Moves a subscription to another stage and re-applies the membership rules.
    #[poise::command(slash_command)]
    pub async fn subscription_stage(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Subscription reference"]
        #[autocomplete = "autocomplete::autocomplete_subscription_name"]
        subscription_name: String,
        #[description = "Target stage"]
        #[autocomplete = "autocomplete::autocomplete_stage_name"]
        stage_name: String,
    ) -> Result<()> {
        let db = &ctx.data().database;

        let Some(found) = subscription::get_subscription_by_name(db, &subscription_name).await?
        else {
            ctx.say(format!("❌ No subscription named '{subscription_name}'."))
                .await?;
            return Ok(());
        };
        let Some(target) = stage::get_stage_by_name(db, &stage_name).await? else {
            ctx.say(format!("❌ No stage named '{stage_name}'.")).await?;
            return Ok(());
        };

        subscription::set_subscription_stage(db, found.id, target.id).await?;
        let owner = partner::require_partner(db, found.partner_id).await?;
        ctx.say(format!(
            "✅ '{}' moved to **{}** ({}). {}: {}",
            found.name,
            target.name,
            target.category,
            owner.name,
            report::format_member_status(&owner)
        ))
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
