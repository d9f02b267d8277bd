// Button dispatch for every component the bot posts.
//
// Custom ids are decoded into one ComponentAction value and handled from
// a single match, instead of one callback type per button group.

use crate::core::voice::VoiceError;
use crate::discord::voice_platform::voice_channel_of;
use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

/// Every button the bot ever attaches to a message, decoded from its
/// custom id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentAction {
    VoiceLock,
    VoiceUnlock,
    VoiceClaim,
    Verify,
    SelfRole(u64),
    TicketOpen,
    TicketClose,
}

impl ComponentAction {
    pub fn parse(custom_id: &str) -> Option<Self> {
        match custom_id {
            "voice:lock" => Some(Self::VoiceLock),
            "voice:unlock" => Some(Self::VoiceUnlock),
            "voice:claim" => Some(Self::VoiceClaim),
            "verify" => Some(Self::Verify),
            "ticket:open" => Some(Self::TicketOpen),
            "ticket:close" => Some(Self::TicketClose),
            other => other
                .strip_prefix("role:")
                .and_then(|id| id.parse().ok())
                .map(Self::SelfRole),
        }
    }

    pub fn custom_id(&self) -> String {
        match self {
            Self::VoiceLock => "voice:lock".to_string(),
            Self::VoiceUnlock => "voice:unlock".to_string(),
            Self::VoiceClaim => "voice:claim".to_string(),
            Self::Verify => "verify".to_string(),
            Self::SelfRole(role_id) => format!("role:{role_id}"),
            Self::TicketOpen => "ticket:open".to_string(),
            Self::TicketClose => "ticket:close".to_string(),
        }
    }
}

/// Entry point called from the gateway event handler for every component
/// interaction. Unknown custom ids are ignored (they may belong to other
/// bots' messages being reposted).
pub async fn dispatch_component(
    ctx: &serenity::Context,
    data: &Data,
    component: &serenity::ComponentInteraction,
) -> Result<(), Error> {
    let Some(action) = ComponentAction::parse(&component.data.custom_id) else {
        return Ok(());
    };

    match action {
        ComponentAction::VoiceLock => {
            voice_action(ctx, data, component, VoiceOp::Lock).await?;
        }
        ComponentAction::VoiceUnlock => {
            voice_action(ctx, data, component, VoiceOp::Unlock).await?;
        }
        ComponentAction::VoiceClaim => {
            voice_action(ctx, data, component, VoiceOp::Claim).await?;
        }
        ComponentAction::Verify => verify(ctx, data, component).await?,
        ComponentAction::SelfRole(role_id) => toggle_role(ctx, component, role_id).await?,
        ComponentAction::TicketOpen => open_ticket(ctx, component).await?,
        ComponentAction::TicketClose => close_ticket(ctx, component).await?,
    }

    Ok(())
}

enum VoiceOp {
    Lock,
    Unlock,
    Claim,
}

async fn voice_action(
    ctx: &serenity::Context,
    data: &Data,
    component: &serenity::ComponentInteraction,
    op: VoiceOp,
) -> Result<(), Error> {
    let Some(guild_id) = component.guild_id else {
        return Ok(());
    };
    let actor = component.user.id;
    let actor_channel = voice_channel_of(&ctx.cache, guild_id, actor);

    let result = match op {
        VoiceOp::Lock => data
            .voice
            .lock(guild_id.get(), actor.get(), actor_channel)
            .await
            .map(|()| ("🔒 Channel locked.".to_string(), true)),
        VoiceOp::Unlock => data
            .voice
            .unlock(guild_id.get(), actor.get(), actor_channel)
            .await
            .map(|()| ("🔓 Channel unlocked.".to_string(), true)),
        VoiceOp::Claim => data
            .voice
            .claim(guild_id.get(), actor.get(), actor_channel)
            .await
            .map(|()| {
                // Claim announcements are public so the room knows who runs it.
                (
                    format!("👑 **{}** is now the room owner.", component.user.name),
                    false,
                )
            }),
    };

    let (message, ephemeral) = match result {
        Ok(reply) => reply,
        Err(err) => (refusal_text(&err), true),
    };
    respond(ctx, component, &message, ephemeral).await
}

fn refusal_text(err: &VoiceError) -> String {
    format!("❌ {err}")
}

async fn verify(
    ctx: &serenity::Context,
    data: &Data,
    component: &serenity::ComponentInteraction,
) -> Result<(), Error> {
    let Some(guild_id) = component.guild_id else {
        return Ok(());
    };

    let Some(role_id) = data.settings.verify_role(guild_id.get()) else {
        return respond(ctx, component, "Verification system is not set up.", true).await;
    };
    let role_id = serenity::RoleId::new(role_id);

    let already_verified = component
        .member
        .as_ref()
        .map(|m| m.roles.contains(&role_id))
        .unwrap_or(false);
    if already_verified {
        return respond(ctx, component, "You are already verified!", true).await;
    }

    ctx.http
        .add_member_role(guild_id, component.user.id, role_id, Some("Verification"))
        .await?;
    respond(ctx, component, "You have been successfully verified!", true).await
}

async fn toggle_role(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    role_id: u64,
) -> Result<(), Error> {
    let Some(guild_id) = component.guild_id else {
        return Ok(());
    };
    let role_id = serenity::RoleId::new(role_id);

    let role_name = ctx
        .cache
        .guild(guild_id)
        .and_then(|g| g.roles.get(&role_id).map(|r| r.name.clone()));
    let Some(role_name) = role_name else {
        return respond(ctx, component, "❌ Role not found.", true).await;
    };

    let has_role = component
        .member
        .as_ref()
        .map(|m| m.roles.contains(&role_id))
        .unwrap_or(false);

    if has_role {
        ctx.http
            .remove_member_role(guild_id, component.user.id, role_id, Some("Self-role"))
            .await?;
        respond(ctx, component, &format!("Removed role: {role_name}"), true).await
    } else {
        ctx.http
            .add_member_role(guild_id, component.user.id, role_id, Some("Self-role"))
            .await?;
        respond(ctx, component, &format!("Added role: {role_name}"), true).await
    }
}

async fn open_ticket(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
) -> Result<(), Error> {
    let Some(guild_id) = component.guild_id else {
        return Ok(());
    };
    let user = &component.user;
    let bot_id = ctx.cache.current_user().id;

    // Mirror the panel's category so tickets land next to it.
    let category = ctx
        .cache
        .guild(guild_id)
        .and_then(|g| g.channels.get(&component.channel_id).and_then(|c| c.parent_id));

    let view = serenity::Permissions::VIEW_CHANNEL;
    let overwrites = vec![
        serenity::PermissionOverwrite {
            allow: serenity::Permissions::empty(),
            deny: view,
            kind: serenity::PermissionOverwriteType::Role(serenity::RoleId::new(guild_id.get())),
        },
        serenity::PermissionOverwrite {
            allow: view
                | serenity::Permissions::SEND_MESSAGES
                | serenity::Permissions::READ_MESSAGE_HISTORY,
            deny: serenity::Permissions::empty(),
            kind: serenity::PermissionOverwriteType::Member(user.id),
        },
        serenity::PermissionOverwrite {
            allow: view | serenity::Permissions::SEND_MESSAGES,
            deny: serenity::Permissions::empty(),
            kind: serenity::PermissionOverwriteType::Member(bot_id),
        },
    ];

    let mut builder = serenity::CreateChannel::new(format!("ticket-{}", user.name))
        .kind(serenity::ChannelType::Text)
        .permissions(overwrites);
    if let Some(category) = category {
        builder = builder.category(category);
    }

    let channel = guild_id.create_channel(&ctx.http, builder).await?;
    let channel_id = channel.id;

    let embed = serenity::CreateEmbed::new()
        .title("🎫 Support Ticket")
        .description(format!(
            "Welcome <@{}>!\nPlease describe your issue and our staff will be with you shortly.",
            user.id
        ))
        .color(0x2ecc71);
    let close_button = serenity::CreateButton::new(ComponentAction::TicketClose.custom_id())
        .label("Close Ticket")
        .emoji('🔒')
        .style(serenity::ButtonStyle::Danger);

    channel_id
        .send_message(
            &ctx.http,
            serenity::CreateMessage::new()
                .embed(embed)
                .components(vec![serenity::CreateActionRow::Buttons(vec![close_button])]),
        )
        .await?;

    respond(
        ctx,
        component,
        &format!("✅ Ticket created! <#{channel_id}>"),
        true,
    )
    .await
}

async fn close_ticket(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
) -> Result<(), Error> {
    respond(ctx, component, "🔒 Closing ticket in 5 seconds...", false).await?;
    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
    component.channel_id.delete(&ctx.http).await?;
    Ok(())
}

async fn respond(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    content: &str,
    ephemeral: bool,
) -> Result<(), Error> {
    component
        .create_response(
            &ctx.http,
            serenity::CreateInteractionResponse::Message(
                serenity::CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(ephemeral),
            ),
        )
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_ids_round_trip() {
        for action in [
            ComponentAction::VoiceLock,
            ComponentAction::VoiceUnlock,
            ComponentAction::VoiceClaim,
            ComponentAction::Verify,
            ComponentAction::SelfRole(42),
            ComponentAction::TicketOpen,
            ComponentAction::TicketClose,
        ] {
            assert_eq!(ComponentAction::parse(&action.custom_id()), Some(action));
        }
    }

    #[test]
    fn unknown_ids_are_ignored() {
        assert_eq!(ComponentAction::parse("music:play"), None);
        assert_eq!(ComponentAction::parse("role:not-a-number"), None);
        assert_eq!(ComponentAction::parse(""), None);
    }
}
