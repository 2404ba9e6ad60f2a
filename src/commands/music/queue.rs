use super::*;

/// View the current music queue
#[poise::command(slash_command, guild_only, category = "Music")]
pub async fn queue(ctx: Context<'_>) -> CommandResult {
    let guild_id = guild_id(ctx)?;
    let page_size = ctx.data().config.queue_page_size;

    let snapshot = ctx.data().music.snapshot(guild_id, page_size).await?;
    ctx.send(embedded_messages::music_queue(&snapshot)).await?;

    Ok(())
}
