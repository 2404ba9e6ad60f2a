//! Framework hooks: command logging and error reporting.

use poise::serenity_prelude as serenity;
use poise::{BoxFuture, FrameworkError};
use tracing::{debug, error, warn};

use crate::commands::music::utils::embedded_messages;
use crate::commands::music::utils::music_manager::MusicError;
use crate::{Context, Data, Error};

/// The presence shown under the bot's name once it is ready.
pub fn presence() -> serenity::ActivityData {
    serenity::ActivityData::listening("Music")
}

pub fn pre_command(ctx: Context<'_>) -> BoxFuture<'_, ()> {
    Box::pin(async move {
        debug!(
            "{} invoked /{} in guild {:?}",
            ctx.author().name,
            ctx.command().qualified_name,
            ctx.guild_id()
        );
    })
}

pub fn post_command(ctx: Context<'_>) -> BoxFuture<'_, ()> {
    Box::pin(async move {
        debug!("Finished /{}", ctx.command().qualified_name);
    })
}

/// Turns command failures into a single red embed.
///
/// `MusicError`s are shown as-is; anything else is logged and answered with
/// a generic message.
pub fn on_error(err: FrameworkError<'_, Data, Error>) -> BoxFuture<'_, ()> {
    Box::pin(async move {
        match err {
            FrameworkError::Setup { error, .. } => error!("Error during startup: {}", error),
            FrameworkError::Command { error, ctx, .. } => {
                let reply = match error.downcast_ref::<MusicError>() {
                    Some(music_error) => {
                        debug!(
                            "/{} rejected: {}",
                            ctx.command().qualified_name,
                            music_error
                        );
                        embedded_messages::music_error(music_error)
                    }
                    None => {
                        error!(
                            "Error in command /{}: {}",
                            ctx.command().qualified_name,
                            error
                        );
                        embedded_messages::error("Something went wrong while running that command.")
                    }
                };

                if let Err(e) = ctx.send(reply).await {
                    warn!("Failed to send error reply: {}", e);
                }
            }
            FrameworkError::GuildOnly { ctx, .. } => {
                let reply = embedded_messages::music_error(&MusicError::NotInGuild);
                if let Err(e) = ctx.send(reply).await {
                    warn!("Failed to send error reply: {}", e);
                }
            }
            other => {
                if let Err(e) = poise::builtins::on_error(other).await {
                    error!("Error while handling error: {}", e);
                }
            }
        }
    })
}
