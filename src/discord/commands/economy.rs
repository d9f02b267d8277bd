// Discord commands for the economy system.
//
// Thin layer: extract ids, call the core service, format the reply.

use crate::core::economy::EconomyError;
use crate::discord::commands::{Context, Error};
use poise::serenity_prelude as serenity;

/// Work to earn some money.
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn work(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?.get();

    match ctx.data().economy.work(ctx.author().id.get(), guild_id).await {
        Ok(outcome) => {
            ctx.say(format!(
                "💰 You worked and earned **{}**! Your new balance is **{}**.",
                outcome.earned, outcome.new_balance
            ))
            .await?;
        }
        Err(err @ EconomyError::OnCooldown(_)) => {
            ctx.say(format!("⏳ {err}")).await?;
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

/// Check your or another member's balance.
#[poise::command(prefix_command, slash_command, guild_only, aliases("bal"))]
pub async fn balance(
    ctx: Context<'_>,
    #[description = "User to check (defaults to you)"] user: Option<serenity::User>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?.get();
    let target = user.as_ref().unwrap_or_else(|| ctx.author());

    let balance = ctx
        .data()
        .economy
        .balance(target.id.get(), guild_id)
        .await?;

    ctx.say(format!(
        "💳 **{}** has a balance of **{balance}**.",
        target.name
    ))
    .await?;
    Ok(())
}

/// Show the server's economy leaderboard.
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn leaderboard(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;

    let top = ctx.data().economy.leaderboard(guild_id.get(), 10).await?;
    if top.is_empty() {
        ctx.say("The leaderboard is currently empty.").await?;
        return Ok(());
    }

    // Resolve display names from the cache before building the embed.
    let mut lines = Vec::with_capacity(top.len());
    for (rank, wallet) in top.iter().enumerate() {
        let name = ctx
            .serenity_context()
            .cache
            .guild(guild_id)
            .and_then(|g| {
                g.members
                    .get(&serenity::UserId::new(wallet.user_id))
                    .map(|m| m.display_name().to_string())
            })
            .unwrap_or_else(|| format!("User {}", wallet.user_id));
        lines.push(format!("**{}. {}** — {}", rank + 1, name, wallet.balance));
    }

    let embed = serenity::CreateEmbed::new()
        .title("🏆 Economy Leaderboard")
        .description(lines.join("\n"))
        .color(0xf1c40f);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
