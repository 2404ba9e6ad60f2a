use super::*;
use crate::commands::music::utils::queue_manager::LoopMode;

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum LoopChoice {
    #[name = "off"]
    Off,
    #[name = "track"]
    Track,
    #[name = "queue"]
    Queue,
}

impl From<LoopChoice> for LoopMode {
    fn from(choice: LoopChoice) -> Self {
        match choice {
            LoopChoice::Off => LoopMode::Off,
            LoopChoice::Track => LoopMode::Track,
            LoopChoice::Queue => LoopMode::Queue,
        }
    }
}

/// Loop the current track, the whole queue, or nothing
#[poise::command(slash_command, guild_only, rename = "loop", category = "Music")]
pub async fn loop_cmd(
    ctx: Context<'_>,
    #[description = "What to loop"] mode: LoopChoice,
) -> CommandResult {
    let guild_id = guild_id(ctx)?;
    let mode = LoopMode::from(mode);

    ctx.data().music.set_loop_mode(guild_id, mode).await?;
    ctx.send(embedded_messages::loop_status(mode)).await?;

    Ok(())
}
