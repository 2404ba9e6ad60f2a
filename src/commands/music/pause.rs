use super::*;

/// Pause the current track
#[poise::command(slash_command, guild_only, category = "Music")]
pub async fn pause(ctx: Context<'_>) -> CommandResult {
    let guild_id = guild_id(ctx)?;

    let outcome = ctx.data().music.pause(guild_id).await?;
    ctx.send(embedded_messages::pause_outcome(outcome)).await?;

    Ok(())
}
