// Discord commands module.
// Each feature gets its own command file.

pub mod admin;

pub mod economy;

pub mod help;

pub mod info;

pub mod leveling;

pub mod moderation;

pub mod voice;

use crate::core::economy::EconomyService;
use crate::core::leveling::LevelingService;
use crate::core::voice::VoiceRoomManager;
use crate::discord::guild_settings::GuildSettings;
use crate::discord::voice_platform::SerenityVoicePlatform;
use crate::infra::economy::JsonWalletStore;
use crate::infra::leveling::JsonXpStore;
use std::sync::Arc;

/// Type alias for our bot's context.
/// This is what every command receives as its first parameter.
pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Data that's shared across all commands.
/// This is where we store our services and configuration.
pub struct Data {
    pub voice: Arc<VoiceRoomManager<SerenityVoicePlatform>>,
    pub economy: Arc<EconomyService<JsonWalletStore>>,
    pub leveling: Arc<LevelingService<JsonXpStore>>,
    pub settings: Arc<GuildSettings>,
}
