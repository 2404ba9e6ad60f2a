use super::*;

/// Skip the current song, or jump ahead in the queue
#[poise::command(slash_command, guild_only, category = "Music")]
pub async fn skip(
    ctx: Context<'_>,
    #[description = "Queue position to skip to (default 1, the next song)"] count: Option<i64>,
) -> CommandResult {
    let guild_id = guild_id(ctx)?;
    let count = count.unwrap_or(1);

    let outcome = ctx.data().music.skip(guild_id, count).await?;
    ctx.send(embedded_messages::skipped(&outcome)).await?;

    Ok(())
}
