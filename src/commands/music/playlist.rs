use super::*;

/// Show the details of a playlist
#[poise::command(slash_command, category = "Music")]
pub async fn playlist(
    ctx: Context<'_>,
    #[description = "Playlist URL"] url: String,
) -> CommandResult {
    ctx.defer().await?;

    match ctx.data().music.search_playlist(&url).await? {
        Some(playlist) => {
            debug!("Found playlist '{}' with {} tracks", playlist.name, playlist.tracks.len());
            ctx.send(embedded_messages::playlist_info(&playlist)).await?;
        }
        None => {
            ctx.send(embedded_messages::error("Please provide a valid playlist URL."))
                .await?;
        }
    }

    Ok(())
}
