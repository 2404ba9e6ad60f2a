use super::*;

/// Remove every song from the queue
#[poise::command(slash_command, guild_only, category = "Music")]
pub async fn clear(ctx: Context<'_>) -> CommandResult {
    let guild_id = guild_id(ctx)?;

    let cleared = ctx.data().music.clear(guild_id).await?;
    ctx.send(embedded_messages::queue_cleared(cleared)).await?;

    Ok(())
}
