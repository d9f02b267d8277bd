// Moderation commands. Permission requirements are declared on each
// command and enforced by the framework before the body runs.

use crate::discord::commands::{Context, Error};
use poise::serenity_prelude as serenity;

const DEFAULT_REASON: &str = "No reason provided";

/// Kick a member.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "KICK_MEMBERS"
)]
pub async fn kick(
    ctx: Context<'_>,
    #[description = "Member to kick"] member: serenity::Member,
    #[description = "Reason"]
    #[rest]
    reason: Option<String>,
) -> Result<(), Error> {
    let reason = reason.unwrap_or_else(|| DEFAULT_REASON.to_string());
    member
        .guild_id
        .kick_with_reason(ctx.http(), member.user.id, &reason)
        .await?;
    ctx.say(format!(
        "✅ Kicked **{}** | Reason: {reason}",
        member.user.name
    ))
    .await?;
    Ok(())
}

/// Ban a member.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "BAN_MEMBERS"
)]
pub async fn ban(
    ctx: Context<'_>,
    #[description = "Member to ban"] member: serenity::Member,
    #[description = "Reason"]
    #[rest]
    reason: Option<String>,
) -> Result<(), Error> {
    let reason = reason.unwrap_or_else(|| DEFAULT_REASON.to_string());
    member
        .guild_id
        .ban_with_reason(ctx.http(), member.user.id, 0, &reason)
        .await?;
    ctx.say(format!(
        "⛔ Banned **{}** | Reason: {reason}",
        member.user.name
    ))
    .await?;
    Ok(())
}

/// Unban a user by id.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "BAN_MEMBERS"
)]
pub async fn unban(
    ctx: Context<'_>,
    #[description = "Id of the user to unban"] user_id: u64,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;
    let user_id = serenity::UserId::new(user_id);

    match guild_id.unban(ctx.http(), user_id).await {
        Ok(()) => {
            let name = ctx
                .http()
                .get_user(user_id)
                .await
                .map(|u| u.name)
                .unwrap_or_else(|_| user_id.to_string());
            ctx.say(format!("✅ Unbanned **{name}**.")).await?;
        }
        Err(_) => {
            ctx.say("❌ No ban found for that user id.").await?;
        }
    }
    Ok(())
}

/// Server-mute a member.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_MESSAGES"
)]
pub async fn mute(
    ctx: Context<'_>,
    #[description = "Member to mute"] member: serenity::Member,
) -> Result<(), Error> {
    member
        .guild_id
        .edit_member(
            ctx.http(),
            member.user.id,
            serenity::EditMember::new().mute(true),
        )
        .await?;
    ctx.say(format!("🔇 Muted **{}**.", member.user.name)).await?;
    Ok(())
}

/// Remove a member's server mute.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_MESSAGES"
)]
pub async fn unmute(
    ctx: Context<'_>,
    #[description = "Member to unmute"] member: serenity::Member,
) -> Result<(), Error> {
    member
        .guild_id
        .edit_member(
            ctx.http(),
            member.user.id,
            serenity::EditMember::new().mute(false),
        )
        .await?;
    ctx.say(format!("🔊 Unmuted **{}**.", member.user.name)).await?;
    Ok(())
}

/// Move a member to a different voice channel.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    rename = "move",
    required_permissions = "MOVE_MEMBERS"
)]
pub async fn move_member(
    ctx: Context<'_>,
    #[description = "Member to move"] member: serenity::Member,
    #[description = "Destination voice channel"] channel: serenity::GuildChannel,
) -> Result<(), Error> {
    if channel.kind != serenity::ChannelType::Voice {
        ctx.say("❌ The destination must be a voice channel.").await?;
        return Ok(());
    }

    member
        .guild_id
        .move_member(ctx.http(), member.user.id, channel.id)
        .await?;
    ctx.say(format!(
        "✅ Moved **{}** to **{}**.",
        member.user.name, channel.name
    ))
    .await?;
    Ok(())
}

/// Clear a number of recent messages from this channel.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    aliases("purge"),
    required_permissions = "MANAGE_MESSAGES"
)]
pub async fn clear(
    ctx: Context<'_>,
    #[description = "How many messages (1-100)"] amount: u8,
) -> Result<(), Error> {
    if amount == 0 || amount > 100 {
        ctx.say("🧹 Usage: `.clear <1-100>`").await?;
        return Ok(());
    }

    // For prefix invocations the command message itself is included.
    let fetch = match ctx {
        poise::Context::Prefix(_) => amount.saturating_add(1).min(100),
        _ => amount,
    };

    let messages = ctx
        .channel_id()
        .messages(ctx.http(), serenity::GetMessages::new().limit(fetch))
        .await?;
    let ids: Vec<serenity::MessageId> = messages.iter().map(|m| m.id).collect();
    let deleted = ids.len();
    ctx.channel_id().delete_messages(ctx.http(), ids).await?;

    ctx.say(format!("✅ Cleared {deleted} messages.")).await?;
    Ok(())
}

/// Set up the jail system.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn setjail(
    ctx: Context<'_>,
    #[description = "Jail role"] role: serenity::Role,
    #[description = "Jail channel"] channel: serenity::GuildChannel,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?.get();
    ctx.data()
        .settings
        .set_jail(guild_id, role.id.get(), channel.id.get());
    ctx.say(format!(
        "✅ Jail system set up! Role: **{}**, Channel: **{}**",
        role.name, channel.name
    ))
    .await?;
    Ok(())
}

/// Jail a member: strip their roles and leave them the jail role.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_MESSAGES"
)]
pub async fn jail(
    ctx: Context<'_>,
    #[description = "Member to jail"] member: serenity::Member,
    #[description = "Reason"]
    #[rest]
    reason: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?.get();
    let Some(jail) = ctx.data().settings.jail(guild_id) else {
        ctx.say("❌ Jail system is not set up. Use `.setjail` first.")
            .await?;
        return Ok(());
    };

    let reason = reason.unwrap_or_else(|| DEFAULT_REASON.to_string());
    member
        .guild_id
        .edit_member(
            ctx.http(),
            member.user.id,
            serenity::EditMember::new()
                .roles(vec![serenity::RoleId::new(jail.role)])
                .audit_log_reason(&format!("Jailed by {}: {reason}", ctx.author().name)),
        )
        .await?;

    serenity::ChannelId::new(jail.channel)
        .say(
            ctx.http(),
            format!(
                "⚖️ <@{}>, you have been jailed.\n**Reason:** {reason}",
                member.user.id
            ),
        )
        .await?;

    ctx.say(format!("✅ **{}** has been jailed.", member.user.name))
        .await?;
    Ok(())
}

/// Release a member from jail.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_MESSAGES"
)]
pub async fn unjail(
    ctx: Context<'_>,
    #[description = "Member to release"] member: serenity::Member,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?.get();
    let Some(jail) = ctx.data().settings.jail(guild_id) else {
        ctx.say("❌ Jail system is not set up.").await?;
        return Ok(());
    };

    let jail_role = serenity::RoleId::new(jail.role);
    if !member.roles.contains(&jail_role) {
        ctx.say(format!("❌ **{}** is not in jail.", member.user.name))
            .await?;
        return Ok(());
    }

    ctx.http()
        .remove_member_role(member.guild_id, member.user.id, jail_role, Some("Unjailed"))
        .await?;
    ctx.say(format!(
        "✅ **{}** has been released. Remember to re-add their roles manually.",
        member.user.name
    ))
    .await?;
    Ok(())
}
