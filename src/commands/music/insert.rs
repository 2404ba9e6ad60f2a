use super::*;
use crate::commands::music::utils::queue_manager::Placement;

/// Queue a song so it plays next
#[poise::command(slash_command, guild_only, category = "Music")]
pub async fn insert(
    ctx: Context<'_>,
    #[description = "URL or search query"] query: String,
) -> CommandResult {
    let guild_id = guild_id(ctx)?;
    play::enqueue(ctx, guild_id, query, Placement::Head).await
}
