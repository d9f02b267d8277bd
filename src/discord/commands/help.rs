// Custom help menu, replacing the framework's default listing.

use crate::discord::commands::{Context, Error};
use poise::serenity_prelude as serenity;

/// Show the command overview.
#[poise::command(prefix_command, slash_command)]
pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
    let embed = serenity::CreateEmbed::new()
        .title("📜 Commands")
        .description("Prefix: `.`")
        .color(0x5865f2)
        .field(
            "🔊 Voice rooms",
            "`.voice lock` `.voice unlock` `.voice reject @user` `.voice permit @user`\n\
             `.voice claim` `.voice rename <name>`\n\
             `.setvoice #channel [category]` (admin)",
            false,
        )
        .field(
            "💰 Economy & Levels",
            "`.work` `.balance [@user]` `.leaderboard` `.rank [@user]`",
            false,
        )
        .field(
            "🔧 Moderation",
            "`.kick @user [reason]` `.ban @user [reason]` `.unban <userId>`\n\
             `.mute @user` `.unmute @user` `.move @user #channel` `.clear <1-100>`\n\
             `.setjail @role #channel` `.jail @user [reason]` `.unjail @user`",
            false,
        )
        .field(
            "⚙️ Setup",
            "`.setwelcome #channel` `.setverify @role [message]`\n\
             `.selfrole Title | RoleId,Label,Emoji | ...` `.tickets`",
            false,
        )
        .field(
            "ℹ️ Info",
            "`.ping` `.userinfo [@user]` `.serverinfo` `.avatar [@user]`\n\
             `.banner [@user]` `.roles [@user]` `.say <text>` `.announce Title | Text`",
            false,
        );

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
