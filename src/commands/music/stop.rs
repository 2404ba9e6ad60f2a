use super::*;

/// Stop the music, clear the queue, and leave the voice channel
#[poise::command(slash_command, guild_only, category = "Music")]
pub async fn stop(ctx: Context<'_>) -> CommandResult {
    let guild_id = guild_id(ctx)?;

    ctx.data().music.stop(guild_id).await?;
    ctx.send(embedded_messages::stopped()).await?;

    Ok(())
}
