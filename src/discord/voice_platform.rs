// Serenity-backed implementation of the VoicePlatform port.
//
// Every method is a single HTTP call (or a cache read for occupancy);
// errors are flattened into VoiceError::Platform so the core never sees
// serenity types.

use crate::core::voice::{VoiceError, VoicePlatform};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

pub struct SerenityVoicePlatform {
    http: Arc<serenity::Http>,
    cache: Arc<serenity::Cache>,
}

impl SerenityVoicePlatform {
    pub fn new(http: Arc<serenity::Http>, cache: Arc<serenity::Cache>) -> Self {
        Self { http, cache }
    }
}

fn platform_err(err: serenity::Error) -> VoiceError {
    VoiceError::Platform(err.to_string())
}

#[async_trait]
impl VoicePlatform for SerenityVoicePlatform {
    async fn create_room(
        &self,
        guild_id: u64,
        name: &str,
        category: Option<u64>,
    ) -> Result<u64, VoiceError> {
        let mut builder = serenity::CreateChannel::new(name).kind(serenity::ChannelType::Voice);
        if let Some(category) = category {
            builder = builder.category(serenity::ChannelId::new(category));
        }

        let channel = serenity::GuildId::new(guild_id)
            .create_channel(&self.http, builder)
            .await
            .map_err(platform_err)?;
        Ok(channel.id.get())
    }

    async fn delete_room(&self, room_id: u64) -> Result<(), VoiceError> {
        serenity::ChannelId::new(room_id)
            .delete(&self.http)
            .await
            .map_err(platform_err)?;
        Ok(())
    }

    async fn rename_room(&self, room_id: u64, name: &str) -> Result<(), VoiceError> {
        serenity::ChannelId::new(room_id)
            .edit(&self.http, serenity::EditChannel::new().name(name))
            .await
            .map_err(platform_err)?;
        Ok(())
    }

    async fn move_member(
        &self,
        guild_id: u64,
        member_id: u64,
        room_id: u64,
    ) -> Result<(), VoiceError> {
        serenity::GuildId::new(guild_id)
            .move_member(
                &self.http,
                serenity::UserId::new(member_id),
                serenity::ChannelId::new(room_id),
            )
            .await
            .map_err(platform_err)?;
        Ok(())
    }

    async fn disconnect_member(&self, guild_id: u64, member_id: u64) -> Result<(), VoiceError> {
        serenity::GuildId::new(guild_id)
            .disconnect_member(&self.http, serenity::UserId::new(member_id))
            .await
            .map_err(platform_err)?;
        Ok(())
    }

    async fn set_everyone_connect(
        &self,
        guild_id: u64,
        room_id: u64,
        allow: bool,
    ) -> Result<(), VoiceError> {
        // The @everyone role id is always the guild id.
        let overwrite = connect_overwrite(
            allow,
            serenity::PermissionOverwriteType::Role(serenity::RoleId::new(guild_id)),
        );
        serenity::ChannelId::new(room_id)
            .create_permission(&self.http, overwrite)
            .await
            .map_err(platform_err)
    }

    async fn set_member_connect(
        &self,
        room_id: u64,
        member_id: u64,
        allow: bool,
    ) -> Result<(), VoiceError> {
        let overwrite = connect_overwrite(
            allow,
            serenity::PermissionOverwriteType::Member(serenity::UserId::new(member_id)),
        );
        serenity::ChannelId::new(room_id)
            .create_permission(&self.http, overwrite)
            .await
            .map_err(platform_err)
    }

    async fn post_control_panel(&self, room_id: u64, owner_id: u64) -> Result<(), VoiceError> {
        let embed = serenity::CreateEmbed::new()
            .title("Voice Room Control")
            .description(format!(
                "✨ **Welcome <@{owner_id}>!**\nThis is your private room.\n\n\
                 Use the buttons below to manage your channel."
            ))
            .color(0x3498db);

        let buttons = vec![
            serenity::CreateButton::new("voice:lock")
                .label("Lock")
                .emoji('🔒')
                .style(serenity::ButtonStyle::Secondary),
            serenity::CreateButton::new("voice:unlock")
                .label("Unlock")
                .emoji('🔓')
                .style(serenity::ButtonStyle::Secondary),
            serenity::CreateButton::new("voice:claim")
                .label("Claim")
                .emoji('👑')
                .style(serenity::ButtonStyle::Success),
        ];

        let message = serenity::CreateMessage::new()
            .content(format!("<@{owner_id}>"))
            .embed(embed)
            .components(vec![serenity::CreateActionRow::Buttons(buttons)]);

        serenity::ChannelId::new(room_id)
            .send_message(&self.http, message)
            .await
            .map_err(platform_err)?;
        Ok(())
    }

    async fn occupants(&self, guild_id: u64, room_id: u64) -> Result<Vec<u64>, VoiceError> {
        let guild = self
            .cache
            .guild(serenity::GuildId::new(guild_id))
            .ok_or_else(|| VoiceError::Platform("guild not in cache".to_string()))?;

        Ok(guild
            .voice_states
            .values()
            .filter(|vs| vs.channel_id.map(|c| c.get()) == Some(room_id))
            .map(|vs| vs.user_id.get())
            .collect())
    }
}

fn connect_overwrite(
    allow: bool,
    kind: serenity::PermissionOverwriteType,
) -> serenity::PermissionOverwrite {
    let (allowed, denied) = if allow {
        (serenity::Permissions::CONNECT, serenity::Permissions::empty())
    } else {
        (serenity::Permissions::empty(), serenity::Permissions::CONNECT)
    };
    serenity::PermissionOverwrite {
        allow: allowed,
        deny: denied,
        kind,
    }
}

/// The voice channel a member currently occupies, from the gateway cache.
/// Used by the command layer to resolve the actor's room before any guard.
pub fn voice_channel_of(
    cache: &serenity::Cache,
    guild_id: serenity::GuildId,
    user_id: serenity::UserId,
) -> Option<u64> {
    cache.guild(guild_id).and_then(|guild| {
        guild
            .voice_states
            .get(&user_id)
            .and_then(|vs| vs.channel_id)
            .map(|c| c.get())
    })
}
