use super::*;
use crate::commands::music::utils::music_manager::PlayRequest;
use crate::commands::music::utils::queue_manager::Placement;

/// Play a song from YouTube or a URL, or resume when no query is given
#[poise::command(slash_command, guild_only, category = "Music")]
pub async fn play(
    ctx: Context<'_>,
    #[description = "URL or search query"] query: Option<String>,
) -> CommandResult {
    let guild_id = guild_id(ctx)?;

    let Some(query) = query else {
        let outcome = ctx.data().music.resume(guild_id).await?;
        ctx.send(embedded_messages::pause_outcome(outcome)).await?;
        return Ok(());
    };

    enqueue(ctx, guild_id, query, Placement::Tail).await
}

/// Search for `query`, queue the result and report back. Shared with `/insert`.
pub(super) async fn enqueue(
    ctx: Context<'_>,
    guild_id: GuildId,
    query: String,
    placement: Placement,
) -> CommandResult {
    info!("Received {:?} enqueue in guild {} with query: {}", placement, guild_id, query);

    let request = PlayRequest {
        query,
        requester: ctx.author().id,
        voice_channel: author_voice_channel(ctx),
        placement,
    };

    // Defer the response since searching might take time
    ctx.defer().await?;

    let outcome = ctx.data().music.play(guild_id, request).await?;
    ctx.send(embedded_messages::play_outcome(&outcome)).await?;

    Ok(())
}
