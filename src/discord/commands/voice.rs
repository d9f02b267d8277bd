// Commands for the temporary voice room system.
//
// Every subcommand resolves the invoker's current voice channel from the
// gateway cache and hands it to the room manager, which owns all the
// authorization rules. This layer only translates results into replies.

use crate::discord::commands::{Context, Error};
use crate::discord::voice_platform::voice_channel_of;
use poise::serenity_prelude as serenity;

/// Where is the actor right now? (guild, actor, current voice channel)
fn actor_location(ctx: &Context<'_>) -> Result<(u64, u64, Option<u64>), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;
    let actor = ctx.author().id;
    let channel = voice_channel_of(&ctx.serenity_context().cache, guild_id, actor);
    Ok((guild_id.get(), actor.get(), channel))
}

/// Voice room management commands.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    subcommands("lock", "unlock", "reject", "permit", "claim", "rename")
)]
pub async fn voice(ctx: Context<'_>) -> Result<(), Error> {
    ctx.say(
        "**Voice Commands:**\n`.voice lock` | `.voice unlock` | `.voice reject @user` | \
         `.voice permit @user` | `.voice claim` | `.voice rename <new name>`",
    )
    .await?;
    Ok(())
}

/// Lock your voice room.
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn lock(ctx: Context<'_>) -> Result<(), Error> {
    let (guild_id, actor, channel) = actor_location(&ctx)?;
    match ctx.data().voice.lock(guild_id, actor, channel).await {
        Ok(()) => ctx.say("🔒 Channel locked.").await?,
        Err(err) => ctx.say(format!("❌ {err}")).await?,
    };
    Ok(())
}

/// Unlock your voice room.
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn unlock(ctx: Context<'_>) -> Result<(), Error> {
    let (guild_id, actor, channel) = actor_location(&ctx)?;
    match ctx.data().voice.unlock(guild_id, actor, channel).await {
        Ok(()) => ctx.say("🔓 Channel unlocked.").await?,
        Err(err) => ctx.say(format!("❌ {err}")).await?,
    };
    Ok(())
}

/// Kick a member from your voice room and keep them out.
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn reject(
    ctx: Context<'_>,
    #[description = "Member to remove"] member: serenity::Member,
) -> Result<(), Error> {
    let (guild_id, actor, channel) = actor_location(&ctx)?;
    let target = member.user.id.get();
    match ctx.data().voice.reject(guild_id, actor, channel, target).await {
        Ok(()) => {
            ctx.say(format!("🚫 Rejected **{}**.", member.user.name))
                .await?
        }
        Err(err) => ctx.say(format!("❌ {err}")).await?,
    };
    Ok(())
}

/// Let a member into your locked voice room.
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn permit(
    ctx: Context<'_>,
    #[description = "Member to allow in"] member: serenity::Member,
) -> Result<(), Error> {
    let (guild_id, actor, channel) = actor_location(&ctx)?;
    let target = member.user.id.get();
    match ctx.data().voice.permit(guild_id, actor, channel, target).await {
        Ok(()) => {
            ctx.say(format!("✅ Gave permission to **{}**.", member.user.name))
                .await?
        }
        Err(err) => ctx.say(format!("❌ {err}")).await?,
    };
    Ok(())
}

/// Take over the room if its owner left.
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn claim(ctx: Context<'_>) -> Result<(), Error> {
    let (guild_id, actor, channel) = actor_location(&ctx)?;
    match ctx.data().voice.claim(guild_id, actor, channel).await {
        Ok(()) => {
            ctx.say(format!(
                "👑 **{}** is now the room owner.",
                ctx.author().name
            ))
            .await?
        }
        Err(err) => ctx.say(format!("❌ {err}")).await?,
    };
    Ok(())
}

/// Rename your voice room.
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn rename(
    ctx: Context<'_>,
    #[description = "New room name"]
    #[rest]
    name: String,
) -> Result<(), Error> {
    let (guild_id, actor, channel) = actor_location(&ctx)?;
    match ctx.data().voice.rename(guild_id, actor, channel, &name).await {
        Ok(()) => ctx.say(format!("📝 Room renamed to: **{name}**")).await?,
        Err(err) => ctx.say(format!("❌ {err}")).await?,
    };
    Ok(())
}

/// Set up the temporary voice room system.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn setvoice(
    ctx: Context<'_>,
    #[description = "The join-to-create channel"] channel: serenity::GuildChannel,
    #[description = "Category for new rooms (defaults to the channel's own)"] category: Option<
        serenity::GuildChannel,
    >,
) -> Result<(), Error> {
    if channel.kind != serenity::ChannelType::Voice {
        ctx.say("❌ The create channel must be a voice channel.").await?;
        return Ok(());
    }
    if let Some(category) = &category {
        if category.kind != serenity::ChannelType::Category {
            ctx.say("❌ The second argument must be a category.").await?;
            return Ok(());
        }
    }

    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?.get();
    let category_id = category
        .map(|c| c.id.get())
        .or_else(|| channel.parent_id.map(|p| p.get()));

    ctx.data()
        .voice
        .configure(guild_id, channel.id.get(), category_id);

    ctx.say(format!(
        "✅ Temporary voice system set up! Join **{}** to create a room.",
        channel.name
    ))
    .await?;
    Ok(())
}
