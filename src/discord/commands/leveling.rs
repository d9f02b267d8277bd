// Discord commands for the leveling system.

use crate::core::leveling::xp_needed;
use crate::discord::commands::{Context, Error};
use poise::serenity_prelude as serenity;

/// Check your or another member's level rank.
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn rank(
    ctx: Context<'_>,
    #[description = "User to check (defaults to you)"] user: Option<serenity::User>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?.get();
    let target = user.as_ref().unwrap_or_else(|| ctx.author());

    if target.bot {
        ctx.say("Bots don't have ranks! 🤖").await?;
        return Ok(());
    }

    let profile = ctx
        .data()
        .leveling
        .profile(target.id.get(), guild_id)
        .await?;

    let needed = xp_needed(profile.level);
    let progress = if needed > 0 {
        profile.xp as f64 / needed as f64 * 100.0
    } else {
        0.0
    };

    let embed = serenity::CreateEmbed::new()
        .title(format!("📊 {}'s Rank", target.name))
        .color(0x3498db)
        .thumbnail(target.face())
        .field("Level", profile.level.to_string(), true)
        .field("XP", format!("{}/{}", profile.xp, needed), true)
        .field("Progress", format!("{progress:.1}%"), true);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
