//! A Discord music bot: slash commands drive a per-guild playback queue and
//! songbird streams the audio.

pub mod commands;
pub mod config;
pub mod events;

use std::sync::Arc;

use commands::music::utils::music_manager::MusicManager;
pub use config::Config;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
pub type CommandResult = Result<(), Error>;

/// User data, which is stored and accessible in all command invocations
pub struct Data {
    pub music: Arc<MusicManager>,
    pub config: Arc<Config>,
}
