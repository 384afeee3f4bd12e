//! Member Discord commands - `member_status`, `add_contact` and `refresh_members`.
//!
//! These commands read and change partners. Membership flags are never set by
//! hand here; they follow from the subscriptions.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::autocomplete},
        core::{
            partner::{self, NewPartner},
            report, subscription,
        },
        errors::{Error, Result},
    };
    use std::fmt::Write as _;

    /// Shows the membership status of a partner with its subscriptions and lines.
    #[poise::command(slash_command)]
    pub async fn member_status(
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

        let member = report::generate_member_report(db, found.id, Some(10)).await?;
        let mut text = format!(
            "**{}**\n{}\nPeriod: {}\nSubscriptions owned: {}{}\n",
            member.partner.name,
            report::format_member_status(&member.partner),
            report::format_period(member.partner.date_first_start, member.partner.date_last_stop),
            member.total_membership,
            if member.individual_member { " (individual)" } else { "" },
        );

        if !member.subscriptions.is_empty() {
            text.push_str("\n**Subscriptions**\n");
            for summary in &member.subscriptions {
                writeln!(text, "• {}", report::format_subscription_summary(summary))?;
            }
        }
        if !member.lines.is_empty() {
            text.push_str("\n**Membership lines**\n");
            for line in &member.lines {
                writeln!(text, "• {}", report::format_line_summary(line))?;
            }
        }

        ctx.say(text).await?;
        Ok(())
    }

    /// Adds a contact to a company.
    ///
    /// The new contact joins the company's current membership: as a member when
    /// the subscription covers all members, otherwise only on its contact list.
    #[poise::command(slash_command)]
    pub async fn add_contact(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Company the contact works for"]
        #[autocomplete = "autocomplete::autocomplete_partner_name"]
        company_name: String,
        #[description = "Full name of the contact"] name: String,
    ) -> Result<()> {
        let db = &ctx.data().database;

        if name.trim().is_empty() {
            ctx.say("❌ Contact name cannot be empty.").await?;
            return Ok(());
        }
        let Some(company) = partner::get_partner_by_name(db, &company_name).await? else {
            ctx.say(format!("❌ No partner named '{company_name}'.")).await?;
            return Ok(());
        };

        let contact = partner::create_partner(db, NewPartner::contact(&name, company.id)).await?;
        let status = if contact.is_member {
            format!("is now a member ({})", report::format_member_status(&contact))
        } else {
            "is not a member".to_string()
        };
        ctx.say(format!(
            "✅ Added **{}** to {} and {status}.",
            contact.name, company.name
        ))
        .await?;
        Ok(())
    }

    /// Recomputes every member flag from the active subscriptions.
    #[poise::command(slash_command)]
    pub async fn refresh_members(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let db = &ctx.data().database;

        let plan = subscription::refresh_all_members(db).await?;
        let outcome = plan.outcome();
        let members = outcome.values().filter(|&&is_member| is_member).count();

        ctx.say(format!(
            "✅ Refreshed {} partner(s): {members} member(s), {} non-member(s).",
            outcome.len(),
            outcome.len() - members
        ))
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
