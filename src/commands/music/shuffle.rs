use super::*;

/// Toggle picking the next song at random
#[poise::command(slash_command, guild_only, category = "Music")]
pub async fn shuffle(ctx: Context<'_>) -> CommandResult {
    let guild_id = guild_id(ctx)?;

    let enabled = ctx.data().music.toggle_shuffle(guild_id).await?;
    ctx.send(embedded_messages::shuffle_status(enabled)).await?;

    Ok(())
}
