// Non-command gateway events: message XP, welcome embeds, and the voice
// transitions that drive room creation and teardown.

use crate::core::voice::ChannelInfo;
use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

/// Award message XP and announce level-ups.
pub async fn handle_message(
    ctx: &serenity::Context,
    data: &Data,
    message: &serenity::Message,
) -> Result<(), Error> {
    if message.author.bot {
        return Ok(());
    }
    let Some(guild_id) = message.guild_id else {
        return Ok(());
    };

    let level_up = data
        .leveling
        .process_message(message.author.id.get(), guild_id.get())
        .await?;

    let Some(level_up) = level_up else {
        return Ok(());
    };

    tracing::info!(
        user_id = level_up.user_id,
        guild_id = level_up.guild_id,
        new_level = level_up.new_level,
        "User leveled up"
    );

    let embed = serenity::CreateEmbed::new()
        .title("🎉 Level Up!")
        .description(format!(
            "Congratulations <@{}>! You reached level **{}**!",
            level_up.user_id, level_up.new_level
        ))
        .color(0x2ecc71)
        .thumbnail(message.author.face());
    message
        .channel_id
        .send_message(&ctx.http, serenity::CreateMessage::new().embed(embed))
        .await?;

    // Reward roles are matched by name so servers can define their own.
    if let Some(role_name) = level_up.reward_role {
        let role_id = ctx
            .cache
            .guild(guild_id)
            .and_then(|g| g.role_by_name(role_name).map(|r| r.id));
        if let Some(role_id) = role_id {
            ctx.http
                .add_member_role(guild_id, message.author.id, role_id, Some("Level reward"))
                .await?;
        }
    }

    Ok(())
}

/// Greet new members in the configured welcome channel, if any.
pub async fn handle_member_join(
    ctx: &serenity::Context,
    data: &Data,
    member: &serenity::Member,
) -> Result<(), Error> {
    let Some(channel_id) = data.settings.welcome_channel(member.guild_id.get()) else {
        return Ok(());
    };

    let member_count = ctx
        .cache
        .guild(member.guild_id)
        .map(|g| g.member_count)
        .unwrap_or_default();

    let embed = serenity::CreateEmbed::new()
        .title("Welcome to the server!")
        .description(format!(
            "Welcome <@{}>! We're glad to have you here.",
            member.user.id
        ))
        .color(0x2ecc71)
        .thumbnail(member.user.face())
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Member #{member_count}"
        )));

    serenity::ChannelId::new(channel_id)
        .send_message(&ctx.http, serenity::CreateMessage::new().embed(embed))
        .await?;
    Ok(())
}

/// Feed voice transitions to the room manager.
///
/// The previous channel's name is snapshotted from the cache because the
/// manager recognizes its own rooms by name prefix.
pub async fn handle_voice_state_update(
    ctx: &serenity::Context,
    data: &Data,
    old: Option<&serenity::VoiceState>,
    new: &serenity::VoiceState,
) -> Result<(), Error> {
    let Some(guild_id) = new.guild_id else {
        return Ok(());
    };

    let member_name = new
        .member
        .as_ref()
        .map(|m| m.user.name.clone())
        .unwrap_or_else(|| "member".to_string());

    let before = old.and_then(|vs| vs.channel_id).and_then(|channel_id| {
        let name = ctx
            .cache
            .guild(guild_id)
            .and_then(|g| g.channels.get(&channel_id).map(|c| c.name.clone()))?;
        Some(ChannelInfo {
            id: channel_id.get(),
            name,
        })
    });
    let after = new.channel_id.map(|c| c.get());

    data.voice
        .handle_voice_state(guild_id.get(), new.user_id.get(), &member_name, before, after)
        .await?;
    Ok(())
}
