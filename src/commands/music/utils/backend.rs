//! The boundary between the queue model and whatever actually streams audio.

use std::time::Duration;

use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId};

use super::music_manager::MusicResult;
use super::queue_manager::{ConnectionId, PlaybackId};
use crate::commands::music::audio_sources::SearchResult;
use crate::commands::music::audio_sources::track_metadata::Track;

/// Notifications the backend raises on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    /// The stream played to the end.
    TrackEnded {
        guild_id: GuildId,
        playback: PlaybackId,
    },
    /// The stream failed while playing.
    TrackErrored {
        guild_id: GuildId,
        playback: PlaybackId,
        reason: String,
    },
    /// The bot left the voice channel (kicked, idle, or driver gave up).
    Disconnected {
        guild_id: GuildId,
        connection: ConnectionId,
    },
}

impl BackendEvent {
    pub fn guild_id(&self) -> GuildId {
        match self {
            BackendEvent::TrackEnded { guild_id, .. }
            | BackendEvent::TrackErrored { guild_id, .. }
            | BackendEvent::Disconnected { guild_id, .. } => *guild_id,
        }
    }
}

/// Voice connection and audio playback for many guilds.
///
/// Every failure is reported as `MusicError::BackendUnavailable`, except
/// `search`, which may also reject its input.
#[async_trait]
pub trait AudioBackend: Send + Sync {
    /// Resolves a URL or free-text query.
    async fn search(&self, query: &str) -> MusicResult<SearchResult>;

    /// Joins (or moves to) a voice channel. A later loss of this connection
    /// is reported as `Disconnected` carrying `connection`.
    async fn connect(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
        connection: ConnectionId,
    ) -> MusicResult<()>;

    /// Leaves the voice channel. Leaving when not connected succeeds.
    async fn disconnect(&self, guild_id: GuildId) -> MusicResult<()>;

    /// Replaces whatever is playing with `track`. Its end is reported with
    /// `playback`.
    async fn play(&self, guild_id: GuildId, track: &Track, playback: PlaybackId)
    -> MusicResult<()>;

    async fn pause(&self, guild_id: GuildId, paused: bool) -> MusicResult<()>;

    /// Stops the current stream. It may still report `TrackEnded` for it.
    async fn stop(&self, guild_id: GuildId) -> MusicResult<()>;

    /// How far into the current stream playback is.
    async fn position(&self, guild_id: GuildId) -> Option<Duration>;
}
