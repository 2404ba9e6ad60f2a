use super::*;

/// Show the track that is playing and how far along it is
#[poise::command(slash_command, guild_only, category = "Music")]
pub async fn nowplaying(ctx: Context<'_>) -> CommandResult {
    let guild_id = guild_id(ctx)?;

    let info = ctx.data().music.now_playing(guild_id).await?;
    ctx.send(embedded_messages::now_playing(&info)).await?;

    Ok(())
}
