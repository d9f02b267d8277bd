// This is the entry point of the Discord bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (JSON stores)
// - `discord/` = Discord-specific adapters (commands, events, platform)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands and event handlers

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::core::economy::EconomyService;
use crate::core::leveling::LevelingService;
use crate::core::voice::VoiceRoomManager;
use crate::discord::guild_settings::GuildSettings;
use crate::discord::voice_platform::SerenityVoicePlatform;
use crate::discord::{events, interactions, Data, Error};
use crate::infra::economy::JsonWalletStore;
use crate::infra::leveling::JsonXpStore;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Event handler for non-command Discord events.
/// This is where messages earn XP and voice transitions drive rooms.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Message { new_message } => {
            if let Err(e) = events::handle_message(ctx, data, new_message).await {
                tracing::error!("Error handling message: {}", e);
            }
        }
        serenity::FullEvent::GuildMemberAddition { new_member } => {
            if let Err(e) = events::handle_member_join(ctx, data, new_member).await {
                tracing::error!("Error handling member join: {}", e);
            }
        }
        serenity::FullEvent::VoiceStateUpdate { old, new } => {
            if let Err(e) =
                events::handle_voice_state_update(ctx, data, old.as_ref(), new).await
            {
                tracing::error!("Error handling voice state update: {}", e);
            }
        }
        serenity::FullEvent::InteractionCreate { interaction } => {
            if let serenity::Interaction::Component(component) = interaction {
                if let Err(e) = interactions::dispatch_component(ctx, data, component).await {
                    tracing::error!(
                        custom_id = %component.data.custom_id,
                        "Error handling component interaction: {}",
                        e
                    );
                }
            }
        }
        _ => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Get Discord bot token from environment
    let token = std::env::var("DISCORD_TOKEN").expect(
        "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.",
    );

    // Keep runtime state files in a dedicated folder so the repo root stays tidy.
    let data_dir = "data";
    std::fs::create_dir_all(data_dir).expect("Failed to create data directory for JSON files");

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their dependencies.
    // The voice manager is wired up later, in the framework setup hook,
    // because its platform adapter needs the gateway's HTTP client.

    let wallet_store = JsonWalletStore::new(format!("{data_dir}/economy.json"))
        .expect("Failed to initialize economy store");
    let economy_service = Arc::new(EconomyService::new(wallet_store));

    let xp_store =
        JsonXpStore::new(format!("{data_dir}/xp.json")).expect("Failed to initialize XP store");
    let leveling_service = Arc::new(LevelingService::new(xp_store));

    let settings = Arc::new(GuildSettings::default());

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to read message content
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::GUILD_VOICE_STATES;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            // Register all our commands here
            commands: vec![
                discord::commands::voice::voice(),
                discord::commands::voice::setvoice(),
                discord::commands::economy::work(),
                discord::commands::economy::balance(),
                discord::commands::economy::leaderboard(),
                discord::commands::leveling::rank(),
                discord::commands::moderation::kick(),
                discord::commands::moderation::ban(),
                discord::commands::moderation::unban(),
                discord::commands::moderation::mute(),
                discord::commands::moderation::unmute(),
                discord::commands::moderation::move_member(),
                discord::commands::moderation::clear(),
                discord::commands::moderation::setjail(),
                discord::commands::moderation::jail(),
                discord::commands::moderation::unjail(),
                discord::commands::admin::setwelcome(),
                discord::commands::admin::setverify(),
                discord::commands::admin::selfrole(),
                discord::commands::admin::tickets(),
                discord::commands::admin::say(),
                discord::commands::admin::announce(),
                discord::commands::info::ping(),
                discord::commands::info::userinfo(),
                discord::commands::info::serverinfo(),
                discord::commands::info::avatar(),
                discord::commands::info::banner(),
                discord::commands::info::roles(),
                discord::commands::help::help(),
            ],
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(".".to_string()),
                ..Default::default()
            },
            // Event handler for messages and other events
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                tracing::info!("Connected as {}", ready.user.name);

                // Register slash commands globally (can take up to an hour to
                // propagate; prefix commands work immediately either way).
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                tracing::info!("Commands registered");

                // The voice platform adapter needs the live HTTP client and
                // cache, which only exist once the client is built.
                let platform = SerenityVoicePlatform::new(ctx.http.clone(), ctx.cache.clone());
                let voice_manager = Arc::new(VoiceRoomManager::new(platform));

                Ok(Data {
                    voice: voice_manager,
                    economy: economy_service,
                    leveling: leveling_service,
                    settings,
                })
            })
        })
        .build();

    // Create the client and start the bot
    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .expect("Error creating client");

    client.start().await.expect("Error running bot");
}
