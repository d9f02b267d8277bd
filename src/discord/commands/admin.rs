// Administrative setup commands: onboarding panels, self-roles, tickets,
// and a couple of announcement helpers.

use crate::discord::commands::{Context, Error};
use crate::discord::interactions::ComponentAction;
use poise::serenity_prelude as serenity;

/// Delete the invoking message on prefix invocations, so panels stand alone.
async fn delete_invocation(ctx: &Context<'_>) {
    if let poise::Context::Prefix(prefix) = ctx {
        let _ = prefix.msg.delete(ctx.http()).await;
    }
}

/// Set the welcome channel.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn setwelcome(
    ctx: Context<'_>,
    #[description = "Channel for welcome messages"] channel: serenity::GuildChannel,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?.get();
    ctx.data()
        .settings
        .set_welcome_channel(guild_id, channel.id.get());
    ctx.say(format!("✅ Welcome channel set to **{}**!", channel.name))
        .await?;
    Ok(())
}

/// Set up button verification.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn setverify(
    ctx: Context<'_>,
    #[description = "Role granted on verification"] role: serenity::Role,
    #[description = "Panel message"]
    #[rest]
    message: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?.get();
    ctx.data().settings.set_verify_role(guild_id, role.id.get());

    let description = message
        .unwrap_or_else(|| "Click the button below to verify and access the server!".to_string());
    let embed = serenity::CreateEmbed::new()
        .title("Server Verification")
        .description(description)
        .color(0x3498db);
    let button = serenity::CreateButton::new(ComponentAction::Verify.custom_id())
        .label("Verify")
        .emoji('✅')
        .style(serenity::ButtonStyle::Success);

    ctx.channel_id()
        .send_message(
            ctx.http(),
            serenity::CreateMessage::new()
                .embed(embed)
                .components(vec![serenity::CreateActionRow::Buttons(vec![button])]),
        )
        .await?;
    delete_invocation(&ctx).await;
    Ok(())
}

/// Post a self-role panel.
///
/// Format: `Title | RoleId,Label,Emoji | RoleId,Label,Emoji | ...`
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn selfrole(
    ctx: Context<'_>,
    #[description = "Title | RoleId,Label,Emoji | ..."]
    #[rest]
    args: String,
) -> Result<(), Error> {
    let mut parts = args.split('|').map(str::trim);
    let Some(title) = parts.next().filter(|t| !t.is_empty()) else {
        ctx.say("❌ Usage: `.selfrole Title | RoleId,Label,Emoji | ...`")
            .await?;
        return Ok(());
    };

    let mut buttons = Vec::new();
    for part in parts {
        let fields: Vec<&str> = part.split(',').map(str::trim).collect();
        let &[role_id, label, emoji] = fields.as_slice() else {
            ctx.say(format!("❌ Could not parse role entry: `{part}`"))
                .await?;
            return Ok(());
        };
        let Ok(role_id) = role_id.parse::<u64>() else {
            ctx.say(format!("❌ Invalid role id: `{role_id}`")).await?;
            return Ok(());
        };

        let mut button = serenity::CreateButton::new(ComponentAction::SelfRole(role_id).custom_id())
            .label(label)
            .style(serenity::ButtonStyle::Secondary);
        if let Some(emoji) = emoji.chars().next() {
            button = button.emoji(emoji);
        }
        buttons.push(button);
    }

    if buttons.is_empty() {
        ctx.say("❌ At least one role entry is required.").await?;
        return Ok(());
    }

    let embed = serenity::CreateEmbed::new()
        .title(title.to_string())
        .description("Click the buttons below to get your roles!")
        .color(0x3498db);

    // Discord caps a row at five buttons.
    let rows = buttons
        .chunks(5)
        .map(|row| serenity::CreateActionRow::Buttons(row.to_vec()))
        .collect();

    ctx.channel_id()
        .send_message(
            ctx.http(),
            serenity::CreateMessage::new().embed(embed).components(rows),
        )
        .await?;
    delete_invocation(&ctx).await;
    Ok(())
}

/// Post the support ticket panel.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn tickets(ctx: Context<'_>) -> Result<(), Error> {
    let embed = serenity::CreateEmbed::new()
        .title("🎫 Support Tickets")
        .description(
            "Need help? Click the button below to create a support ticket.\n\n\
             Our staff team will assist you shortly.",
        )
        .field("📋 General Support", "For general questions and help", true)
        .field("⚠️ Report Issue", "Report bugs or issues", true)
        .color(0x5865f2);
    let button = serenity::CreateButton::new(ComponentAction::TicketOpen.custom_id())
        .label("Create Ticket")
        .emoji('🎫')
        .style(serenity::ButtonStyle::Primary);

    ctx.channel_id()
        .send_message(
            ctx.http(),
            serenity::CreateMessage::new()
                .embed(embed)
                .components(vec![serenity::CreateActionRow::Buttons(vec![button])]),
        )
        .await?;
    delete_invocation(&ctx).await;
    Ok(())
}

/// Repeat a message as the bot.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn say(
    ctx: Context<'_>,
    #[description = "Text to send"]
    #[rest]
    text: String,
) -> Result<(), Error> {
    delete_invocation(&ctx).await;
    ctx.channel_id().say(ctx.http(), text).await?;
    Ok(())
}

/// Send an embed. Format: `Title | Description`
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn announce(
    ctx: Context<'_>,
    #[description = "Title | Description"]
    #[rest]
    text: String,
) -> Result<(), Error> {
    let (title, description) = match text.split_once('|') {
        Some((title, description)) => (title.trim(), description.trim()),
        None => ("Announcement", text.trim()),
    };

    let embed = serenity::CreateEmbed::new()
        .title(title.to_string())
        .description(description.to_string())
        .color(0x3498db);
    ctx.channel_id()
        .send_message(ctx.http(), serenity::CreateMessage::new().embed(embed))
        .await?;
    delete_invocation(&ctx).await;
    Ok(())
}
