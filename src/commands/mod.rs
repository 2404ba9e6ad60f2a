//! This module aggregates all the command modules for the bot.

/// General purpose commands (e.g., help, register).
pub mod general;
/// Commands related to music playback.
pub mod music;

use crate::{Data, Error};

/// Every command the bot registers
pub fn all() -> Vec<poise::Command<Data, Error>> {
    let mut commands = general::commands();
    commands.extend(music::commands());
    commands
}
