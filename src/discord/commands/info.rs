// Informational commands: latency, user and server lookups.

use crate::discord::commands::{Context, Error};
use poise::serenity_prelude as serenity;

/// Check the bot's gateway latency.
#[poise::command(prefix_command, slash_command)]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    let latency = ctx.ping().await;
    ctx.say(format!("🏓 Pong! Gateway: `{}ms`", latency.as_millis()))
        .await?;
    Ok(())
}

/// Show information about a member.
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn userinfo(
    ctx: Context<'_>,
    #[description = "Member to inspect (defaults to you)"] member: Option<serenity::Member>,
) -> Result<(), Error> {
    let member = match member {
        Some(member) => member,
        None => ctx
            .author_member()
            .await
            .ok_or("Could not resolve you as a guild member")?
            .into_owned(),
    };
    let user = &member.user;

    let roles = member
        .roles
        .iter()
        .map(|r| format!("<@&{r}>"))
        .collect::<Vec<_>>()
        .join(" ");
    let joined = member
        .joined_at
        .map(|t| format!("<t:{}:R>", t.unix_timestamp()))
        .unwrap_or_else(|| "N/A".to_string());

    let embed = serenity::CreateEmbed::new()
        .title(format!("Info about {}", user.name))
        .color(0x2ecc71)
        .thumbnail(user.face())
        .field("🆔 ID", user.id.to_string(), true)
        .field("📛 Username", user.name.clone(), true)
        .field("📅 Joined server", joined, true)
        .field(
            "📅 Account created",
            format!("<t:{}:R>", user.created_at().unix_timestamp()),
            true,
        )
        .field(
            "🎭 Roles",
            if roles.is_empty() {
                "No roles".to_string()
            } else {
                roles
            },
            false,
        );
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Show information about this server.
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn serverinfo(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;

    // Copy everything out of the cache before the send await.
    let snapshot = {
        let guild = ctx
            .serenity_context()
            .cache
            .guild(guild_id)
            .ok_or("Guild not in cache")?;

        let text_channels = guild
            .channels
            .values()
            .filter(|c| c.kind == serenity::ChannelType::Text)
            .count();
        let voice_channels = guild
            .channels
            .values()
            .filter(|c| c.kind == serenity::ChannelType::Voice)
            .count();
        (
            guild.name.clone(),
            guild.icon_url(),
            guild.owner_id,
            guild.member_count,
            text_channels,
            voice_channels,
        )
    };
    let (name, icon_url, owner_id, member_count, text_channels, voice_channels) = snapshot;

    let mut embed = serenity::CreateEmbed::new()
        .title(format!("Server info: {name}"))
        .color(0xe67e22)
        .field("🆔 ID", guild_id.to_string(), true)
        .field("👑 Owner", format!("<@{owner_id}>"), true)
        .field("👥 Members", member_count.to_string(), true)
        .field(
            "📅 Created",
            format!("<t:{}:R>", guild_id.created_at().unix_timestamp()),
            true,
        )
        .field("💬 Text channels", text_channels.to_string(), true)
        .field("🔊 Voice channels", voice_channels.to_string(), true);
    if let Some(icon) = icon_url {
        embed = embed.thumbnail(icon);
    }

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Show a user's avatar.
#[poise::command(prefix_command, slash_command, aliases("a"))]
pub async fn avatar(
    ctx: Context<'_>,
    #[description = "User to show (defaults to you)"] user: Option<serenity::User>,
) -> Result<(), Error> {
    let user = user.as_ref().unwrap_or_else(|| ctx.author());
    let embed = serenity::CreateEmbed::new()
        .title(format!("Avatar of {}", user.name))
        .color(0x3498db)
        .image(user.face());
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Show a user's profile banner.
#[poise::command(prefix_command, slash_command, aliases("b"))]
pub async fn banner(
    ctx: Context<'_>,
    #[description = "User to show (defaults to you)"] user: Option<serenity::User>,
) -> Result<(), Error> {
    let user = user.as_ref().unwrap_or_else(|| ctx.author());

    // Banners are only populated on a full user fetch.
    let fetched = ctx.http().get_user(user.id).await?;
    match fetched.banner_url() {
        Some(url) => {
            ctx.say(url).await?;
        }
        None => {
            ctx.say(format!("**{}** does not have a banner.", fetched.name))
                .await?;
        }
    }
    Ok(())
}

/// List a member's roles.
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn roles(
    ctx: Context<'_>,
    #[description = "Member to inspect (defaults to you)"] member: Option<serenity::Member>,
) -> Result<(), Error> {
    let member = match member {
        Some(member) => member,
        None => ctx
            .author_member()
            .await
            .ok_or("Could not resolve you as a guild member")?
            .into_owned(),
    };

    let roles = member
        .roles
        .iter()
        .map(|r| format!("<@&{r}>"))
        .collect::<Vec<_>>()
        .join(" ");

    let embed = serenity::CreateEmbed::new()
        .title(format!("Roles of {}", member.user.name))
        .description(if roles.is_empty() {
            "No roles".to_string()
        } else {
            roles
        })
        .color(0x9b59b6)
        .thumbnail(member.user.face());
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
