//! Membership line Discord commands.
//!
//! `membership_line` opens a line, `confirm_membership` and `cancel_membership`
//! move it through its states, and `invoice_membership` runs the invoicing wizard.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::autocomplete},
        core::{
            invoice::{self, InvoiceRequest},
            membership_line::{self, NewMembershipLine},
            partner, product, report,
        },
        errors::{Error, Result},
    };
    use chrono::Utc;

    /// Opens a membership line for the current calendar year.
    #[poise::command(slash_command)]
    pub async fn membership_line(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Member company or contact"]
        #[autocomplete = "autocomplete::autocomplete_partner_name"]
        partner_name: String,
        #[description = "Membership product"]
        #[autocomplete = "autocomplete::autocomplete_product_name"]
        product_name: String,
        #[description = "Cover every contact of the partner"] all_members: Option<bool>,
    ) -> Result<()> {
        let db = &ctx.data().database;

        let Some(member) = partner::get_partner_by_name(db, &partner_name).await? else {
            ctx.say(format!("❌ No partner named '{partner_name}'.")).await?;
            return Ok(());
        };
        let Some(fee) = product::get_product_by_name(db, &product_name).await? else {
            ctx.say(format!("❌ No product named '{product_name}'.")).await?;
            return Ok(());
        };

        let mut new = NewMembershipLine::for_partner(member.id, fee.id);
        new.all_members = all_members.unwrap_or(false);
        if new.all_members {
            new.contact_ids = partner::child_ids(db, member.id).await?;
        }

        let line = membership_line::create_membership_line(db, new).await?;
        ctx.say(format!(
            "✅ Opened membership line for {}: {}",
            member.name,
            report::format_line_summary(&line)
        ))
        .await?;
        Ok(())
    }

    /// Confirms a draft membership line, or reopens a canceled one.
    #[poise::command(slash_command)]
    pub async fn confirm_membership(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Membership line number"] line_id: i64,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let line = membership_line::action_post(db, line_id).await?;
        ctx.say(format!("✅ {}", report::format_line_summary(&line)))
            .await?;
        Ok(())
    }

    /// Cancels a membership line. Paid lines cannot be canceled.
    #[poise::command(slash_command)]
    pub async fn cancel_membership(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Membership line number"] line_id: i64,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let line = membership_line::button_cancel(db, line_id, Utc::now().date_naive()).await?;
        ctx.say(format!("✅ {}", report::format_line_summary(&line)))
            .await?;
        Ok(())
    }

    /// Drafts the invoice of a membership line.
    ///
    /// Only the line's partner, or its contacts when the line covers all members,
    /// can be invoiced.
    #[poise::command(slash_command)]
    pub async fn invoice_membership(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Membership line number"] line_id: i64,
        #[description = "Partner to invoice, defaults to the line's partner"]
        #[autocomplete = "autocomplete::autocomplete_partner_name"]
        partner_name: Option<String>,
        #[description = "Unit price, defaults to the line's fee"] price: Option<f64>,
    ) -> Result<()> {
        let db = &ctx.data().database;

        let line = membership_line::require_membership_line(db, line_id).await?;
        let partner_id = match partner_name {
            Some(name) => {
                let Some(found) = partner::get_partner_by_name(db, &name).await? else {
                    ctx.say(format!("❌ No partner named '{name}'.")).await?;
                    return Ok(());
                };
                found.id
            }
            None => line.partner_id,
        };
        let request = InvoiceRequest {
            partner_id,
            product_id: line.product_id,
            unit_price: price.unwrap_or(line.member_price),
            membership_line_id: Some(line.id),
        };

        match invoice::create_membership_invoice(db, request).await {
            Ok(action) => {
                let ids: Vec<String> = action
                    .navigation
                    .domain_ids
                    .iter()
                    .map(ToString::to_string)
                    .collect();
                ctx.say(format!(
                    "✅ {}: draft invoice #{} created.",
                    action.navigation.name,
                    ids.join(", #")
                ))
                .await?;
            }
            Err(
                e @ (Error::MissingInvoiceAddress { .. }
                | Error::InvalidAmount { .. }
                | Error::IneligiblePartner { .. }),
            ) => {
                ctx.say(format!("❌ {e}")).await?;
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
