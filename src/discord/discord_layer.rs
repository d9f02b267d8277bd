// Discord layer - commands, event handlers, and platform adapters.

#[path = "commands/command_catalog.rs"]
pub mod commands;

pub mod events;

pub mod guild_settings;

pub mod interactions;

pub mod voice_platform;

// Re-export command types for convenience
pub use commands::{Data, Error};
