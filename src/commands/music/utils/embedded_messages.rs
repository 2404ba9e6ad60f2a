use poise::{CreateReply, serenity_prelude as serenity};
use serenity::all::CreateEmbed;
use std::time::Duration;

use super::format_duration;
use super::music_manager::{
    Enqueued, MusicError, NowPlayingInfo, PauseOutcome, PlayOutcome, QueueSnapshot, SkipOutcome,
};
use super::queue_manager::LoopMode;
use crate::commands::music::audio_sources::track_metadata::{Playlist, Track};

/// Colour of every informational embed
const COLOR: u32 = 0x22a7f2;
const ERROR_COLOR: u32 = 0xff0000;

/// Create a progress bar for the current track
fn format_progress_bar(position: Duration, total: Duration) -> String {
    const BAR_LENGTH: usize = 15;
    let progress = if total.as_secs() == 0 {
        0.0
    } else {
        (position.as_secs_f64() / total.as_secs_f64()).min(1.0)
    };

    let filled = (progress * BAR_LENGTH as f64).round() as usize;
    let empty = BAR_LENGTH - filled;

    format!("▬{}🔘{}▬", "▬".repeat(filled), "▬".repeat(empty))
}

fn reply(embed: CreateEmbed) -> CreateReply {
    CreateReply::default().embed(embed.color(COLOR))
}

/// Create a plain informational embed
pub fn info(message: impl Into<String>) -> CreateReply {
    reply(CreateEmbed::new().description(message.into()))
}

/// Create an embed for an error shown to the user
pub fn error(message: impl Into<String>) -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title("❌ Error")
            .description(message.into())
            .color(ERROR_COLOR),
    )
}

/// Create an embed for a failed music operation
pub fn music_error(err: &MusicError) -> CreateReply {
    error(err.to_string())
}

/// Create an embed for the result of `/play` or `/insert`
pub fn play_outcome(outcome: &PlayOutcome) -> CreateReply {
    let description = match &outcome.added {
        Enqueued::Track(track) => format!("Added `{}` to the queue.", track.title),
        Enqueued::Playlist { name, count } => {
            format!("Added {} songs from **`{}`** to the queue.", count, name)
        }
    };

    let mut embed = CreateEmbed::new().description(description);
    if let Some(track) = &outcome.started {
        embed = embed
            .title("🎵 Now Playing")
            .field("Track", track.to_string(), false)
            .field("Duration", format!("`{}`", track.length_string()), true);
        if let Some(artwork) = &track.artwork_url {
            embed = embed.thumbnail(artwork);
        }
    }
    embed = embed.field("In queue", format!("`{}`", outcome.queue_len), true);

    reply(embed)
}

/// Create an embed for a pause or resume request
pub fn pause_outcome(outcome: PauseOutcome) -> CreateReply {
    let message = match outcome {
        PauseOutcome::Paused => "⏸️ Song paused.",
        PauseOutcome::AlreadyPaused => "Song is already paused.",
        PauseOutcome::Resumed => "▶️ Song resumed.",
        PauseOutcome::AlreadyPlaying => "Song is already playing.",
    };
    info(message)
}

/// Text of the `/queue` embed
pub(crate) fn queue_description(snapshot: &QueueSnapshot) -> String {
    let mut description = String::new();

    if let Some(track) = &snapshot.current {
        description.push_str("**🎵 Now Playing**\n");
        description.push_str(&format!("**{}** `{}`", track, track.length_string()));
        if snapshot.paused {
            description.push_str(" ⏸️");
        }
        description.push_str("\n\n");
    }

    if snapshot.upcoming.is_empty() {
        description.push_str("**📭 Queue is empty**");
        return description;
    }

    description.push_str(&format!("**📋 Queue - {} tracks**\n", snapshot.queue_len));
    for (index, track) in snapshot.upcoming.iter().enumerate() {
        description.push_str(&format!(
            "{}. {} `{}`\n",
            index + 1,
            track,
            track.length_string()
        ));
    }

    let hidden = snapshot.queue_len.saturating_sub(snapshot.upcoming.len());
    if hidden > 0 {
        description.push_str(&format!("…and {} more\n", hidden));
    }

    if snapshot.total_duration.as_secs() > 0 {
        description.push_str(&format!(
            "\n**⏱️ Total Duration:** `{}`",
            format_duration(snapshot.total_duration)
        ));
    }

    description
}

/// Create an embed for the music queue
pub fn music_queue(snapshot: &QueueSnapshot) -> CreateReply {
    if snapshot.current.is_none() && snapshot.queue_len == 0 {
        return info("Queue is empty.");
    }

    reply(
        CreateEmbed::new()
            .title("🎵 Music Queue")
            .description(queue_description(snapshot))
            .field("Loop", format!("`{}`", snapshot.loop_mode), true)
            .field(
                "Shuffle",
                if snapshot.shuffle { "`On`" } else { "`Off`" },
                true,
            ),
    )
}

/// Create an embed for when a song is now playing
pub fn now_playing(info: &NowPlayingInfo) -> CreateReply {
    let track = &info.track;
    let mut embed = CreateEmbed::new()
        .title(if info.paused {
            "⏸️ Paused"
        } else {
            "🎵 Now Playing"
        })
        .description(track.to_string());

    match (info.position, track.duration) {
        (Some(position), Some(duration)) => {
            embed = embed.field(
                "Progress",
                format!(
                    "{} `{}/{}`",
                    format_progress_bar(position, duration),
                    format_duration(position),
                    format_duration(duration)
                ),
                false,
            );
        }
        _ => embed = embed.field("Duration", format!("`{}`", track.length_string()), true),
    }

    if let Some(requester) = track.requester {
        embed = embed.field("Requested by", format!("<@{}>", requester), true);
    }
    if let Some(artwork) = &track.artwork_url {
        embed = embed.thumbnail(artwork);
    }

    reply(embed)
}

/// Create an embed for when tracks are skipped
pub fn skipped(outcome: &SkipOutcome) -> CreateReply {
    let mut description = format!("⏭️ Skipped {}", outcome.skipped);
    if outcome.dropped > 0 {
        description.push_str(&format!(
            " and {} queued track(s)",
            outcome.dropped
        ));
    }
    description.push('.');

    let mut embed = CreateEmbed::new().description(description);
    embed = match &outcome.next {
        Some(track) => embed.field("Up next", track.to_string(), false),
        None => embed.field("Up next", "Nothing, the queue is empty.", false),
    };

    reply(embed)
}

/// Create an embed for a shuffle toggle
pub fn shuffle_status(enabled: bool) -> CreateReply {
    info(if enabled {
        "🔀 Shuffle enabled."
    } else {
        "➡️ Shuffle disabled."
    })
}

/// Create an embed for a loop mode change
pub fn loop_status(mode: LoopMode) -> CreateReply {
    info(match mode {
        LoopMode::Off => "Looping disabled.".to_string(),
        LoopMode::Track => "🔂 Looping the current track.".to_string(),
        LoopMode::Queue => "🔁 Looping the queue.".to_string(),
    })
}

/// Create an embed for when a track is removed from the queue
pub fn track_removed(track: &Track, position: i64) -> CreateReply {
    info(format!("🗑️ Removed {} from position #{}", track, position))
}

/// Create an embed for a cleared queue
pub fn queue_cleared(count: usize) -> CreateReply {
    info(format!("🧹 Cleared {} track(s) from the queue.", count))
}

/// Create an embed for when the bot stops playing music
pub fn stopped() -> CreateReply {
    info("⏹️ Player Terminated.")
}

/// Create an embed describing a playlist
pub fn playlist_info(playlist: &Playlist) -> CreateReply {
    let mut embed = CreateEmbed::new()
        .title(format!("📜 {}", playlist.name))
        .field("Tracks", format!("`{}`", playlist.tracks.len()), true);

    if let Some(url) = &playlist.url {
        embed = embed.url(url);
    }

    let total = playlist.total_duration();
    if total.as_secs() > 0 {
        embed = embed.field("Duration", format!("`{}`", format_duration(total)), true);
    }
    if let Some(artwork) = &playlist.artwork_url {
        embed = embed.thumbnail(artwork);
    }

    reply(embed)
}
