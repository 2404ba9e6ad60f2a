pub(crate) mod clear;
pub(crate) mod insert;
pub(crate) mod loop_cmd;
pub(crate) mod nowplaying;
pub(crate) mod pause;
pub(crate) mod play;
pub(crate) mod playlist;
pub(crate) mod queue;
pub(crate) mod remove;
pub(crate) mod shuffle;
pub(crate) mod skip;
pub(crate) mod stop;

pub mod audio_sources;
pub mod utils;

use crate::{CommandResult, Context};
use poise::serenity_prelude::{ChannelId, GuildId};
use tracing::{debug, info};
use utils::embedded_messages;
use utils::music_manager::MusicError;

/// The guild a command was invoked in
fn guild_id(ctx: Context<'_>) -> Result<GuildId, MusicError> {
    ctx.guild_id().ok_or(MusicError::NotInGuild)
}

/// The voice channel the invoking user is connected to, read from the cache
fn author_voice_channel(ctx: Context<'_>) -> Option<ChannelId> {
    let guild = ctx.guild()?;
    guild
        .voice_states
        .get(&ctx.author().id)
        .and_then(|state| state.channel_id)
}

/// Every music command, in the order they appear in `/help`
pub fn commands() -> Vec<poise::Command<crate::Data, crate::Error>> {
    vec![
        play::play(),
        insert::insert(),
        pause::pause(),
        queue::queue(),
        nowplaying::nowplaying(),
        skip::skip(),
        shuffle::shuffle(),
        loop_cmd::loop_cmd(),
        remove::remove(),
        clear::clear(),
        stop::stop(),
        playlist::playlist(),
    ]
}
