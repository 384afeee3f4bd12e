//! General Discord commands - ping, help, and other utility commands.
//! This module contains simple commands that don't require database operations
//! and provide basic bot functionality and user assistance.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    ///
    /// This is a simple health check command that doesn't require any database operations.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**MembershipBuddy Help**\n\
        Here is a summary of all available commands.\n\n\
        **Members**\n\
        • `/member_status <partner>` - Shows membership status, subscriptions and lines.\n\
        • `/add_contact <company> <name>` - Adds a contact; it inherits the company's membership when allowed.\n\
        • `/refresh_members` - Recomputes every member flag from the subscriptions.\n\n\
        **Subscriptions**\n\
        • `/subscriptions <partner>` - Lists the subscriptions of a partner and its contacts.\n\
        • `/subscription_stage <subscription> <stage>` - Moves a subscription to another stage.\n\n\
        **Membership lines**\n\
        • `/membership_line <partner> <product>` - Opens a membership line for the current year.\n\
        • `/confirm_membership <line>` - Confirms a draft line or reopens a canceled one.\n\
        • `/cancel_membership <line>` - Cancels an unpaid line.\n\
        • `/invoice_membership <line> [price]` - Drafts the membership invoice.\n\n\
        **Utility Commands**\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
