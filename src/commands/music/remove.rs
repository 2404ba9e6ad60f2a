use super::*;

/// Remove a track from the queue by its position
#[poise::command(slash_command, guild_only, category = "Music")]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "Position of the track to remove (1-based)"] index: i64,
) -> CommandResult {
    let guild_id = guild_id(ctx)?;

    let removed = ctx.data().music.remove(guild_id, index).await?;
    ctx.send(embedded_messages::track_removed(&removed, index))
        .await?;

    Ok(())
}
