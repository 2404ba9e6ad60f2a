//! `AudioBackend` built on songbird voice connections, with tracks resolved
//! and streamed through `yt-dlp`.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use poise::serenity_prelude as serenity;
use serenity::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use songbird::input::YoutubeDl;
use songbird::tracks::TrackHandle;
use songbird::{CoreEvent, Event, Songbird, TrackEvent};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, instrument, warn};

use super::backend::{AudioBackend, BackendEvent};
use super::event_handlers::{DisconnectNotifier, IdleChecker, SongEndNotifier};
use super::music_manager::{MusicError, MusicResult};
use super::queue_manager::{ConnectionId, PlaybackId};
use crate::commands::music::audio_sources::SearchResult;
use crate::commands::music::audio_sources::track_metadata::Track;
use crate::commands::music::audio_sources::youtube::YoutubeApi;
use crate::config::Config;

pub struct SongbirdBackend {
    songbird: Arc<Songbird>,
    cache: Arc<serenity::Cache>,
    http: reqwest::Client,
    youtube: YoutubeApi,
    /// Program songbird spawns to stream audio.
    ytdlp_program: &'static str,
    idle_timeout: Duration,
    events: UnboundedSender<BackendEvent>,
    // Map of guild ID to the handle of the stream playing there
    tracks: DashMap<GuildId, TrackHandle>,
    // Connection the global voice events of each guild's call report for
    connections: DashMap<GuildId, ConnectionId>,
}

impl SongbirdBackend {
    pub fn new(
        songbird: Arc<Songbird>,
        cache: Arc<serenity::Cache>,
        config: &Config,
        events: UnboundedSender<BackendEvent>,
    ) -> Self {
        // songbird wants a 'static program name; this is built once per process.
        let ytdlp_program: &'static str = Box::leak(config.ytdlp_path.clone().into_boxed_str());

        Self {
            songbird,
            cache,
            http: reqwest::Client::new(),
            youtube: YoutubeApi::new(config.ytdlp_path.clone(), config.search_prefix.clone()),
            ytdlp_program,
            idle_timeout: config.idle_timeout,
            events,
            tracks: DashMap::new(),
            connections: DashMap::new(),
        }
    }

    /// Registers the disconnect and idle handlers on the guild's call, once
    /// per connection. A call left over from an earlier connection has its
    /// handlers replaced.
    async fn init_global_events(&self, guild_id: GuildId, connection: ConnectionId) {
        if self
            .connections
            .get(&guild_id)
            .is_some_and(|registered| *registered == connection)
            && self.songbird.get(guild_id).is_some()
        {
            return;
        }

        let call = self.songbird.get_or_insert(guild_id);
        let mut call = call.lock().await;
        call.remove_all_global_events();

        debug!(
            "Registering global voice events for connection {} in guild {}",
            connection, guild_id
        );
        call.add_global_event(
            Event::Core(CoreEvent::DriverDisconnect),
            DisconnectNotifier {
                guild_id,
                connection,
                songbird: self.songbird.clone(),
                events: self.events.clone(),
            },
        );
        call.add_global_event(
            Event::Periodic(self.idle_timeout, None),
            IdleChecker {
                guild_id,
                connection,
                songbird: self.songbird.clone(),
                cache: self.cache.clone(),
                events: self.events.clone(),
            },
        );
        self.connections.insert(guild_id, connection);
    }

    fn handle(&self, guild_id: GuildId) -> MusicResult<TrackHandle> {
        self.tracks
            .get(&guild_id)
            .map(|handle| handle.clone())
            .ok_or_else(|| MusicError::BackendUnavailable("Nothing is playing".to_string()))
    }
}

#[async_trait]
impl AudioBackend for SongbirdBackend {
    async fn search(&self, query: &str) -> MusicResult<SearchResult> {
        self.youtube.resolve(query).await
    }

    #[instrument(skip(self))]
    async fn connect(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
        connection: ConnectionId,
    ) -> MusicResult<()> {
        self.init_global_events(guild_id, connection).await;

        let call = match self.songbird.join(guild_id, channel_id).await {
            Ok(call) => call,
            Err(err) => {
                warn!(
                    "Failed to join voice channel {} for guild {}: {}",
                    channel_id, guild_id, err
                );
                self.connections.remove(&guild_id);
                if let Err(err) = self.songbird.remove(guild_id).await {
                    debug!("Nothing to clean up after failed join: {}", err);
                }
                return Err(MusicError::BackendUnavailable(format!(
                    "Failed to join voice channel: {}",
                    err
                )));
            }
        };

        let mut handler = call.lock().await;
        if let Err(err) = handler.deafen(true).await {
            warn!("Failed to self-deafen in guild {}: {}", guild_id, err);
        }

        info!("Joined voice channel {} in guild {}", channel_id, guild_id);
        Ok(())
    }

    async fn disconnect(&self, guild_id: GuildId) -> MusicResult<()> {
        self.tracks.remove(&guild_id);
        self.connections.remove(&guild_id);

        if self.songbird.get(guild_id).is_none() {
            return Ok(());
        }

        self.songbird.remove(guild_id).await.map_err(|err| {
            MusicError::BackendUnavailable(format!("Failed to leave voice channel: {}", err))
        })?;

        info!("Left voice channel in guild {}", guild_id);
        Ok(())
    }

    #[instrument(skip(self, track), fields(title = %track.title))]
    async fn play(&self, guild_id: GuildId, track: &Track, playback: PlaybackId) -> MusicResult<()> {
        let call = self.songbird.get(guild_id).ok_or_else(|| {
            MusicError::BackendUnavailable("Not connected to a voice channel".to_string())
        })?;

        let input = YoutubeDl::new_ytdl_like(self.ytdlp_program, self.http.clone(), track.uri.clone());
        let handle = {
            let mut handler = call.lock().await;
            handler.play_only_input(input.into())
        };

        for event in [TrackEvent::End, TrackEvent::Error] {
            let notifier = SongEndNotifier {
                guild_id,
                playback,
                events: self.events.clone(),
            };
            handle
                .add_event(Event::Track(event), notifier)
                .map_err(|err| MusicError::BackendUnavailable(err.to_string()))?;
        }

        self.tracks.insert(guild_id, handle);
        info!("Playing '{}' as stream {} in guild {}", track.title, playback, guild_id);
        Ok(())
    }

    async fn pause(&self, guild_id: GuildId, paused: bool) -> MusicResult<()> {
        let handle = self.handle(guild_id)?;
        let result = if paused { handle.pause() } else { handle.play() };
        result.map_err(|err| MusicError::BackendUnavailable(err.to_string()))
    }

    async fn stop(&self, guild_id: GuildId) -> MusicResult<()> {
        if let Some((_, handle)) = self.tracks.remove(&guild_id) {
            // A stream that already ended refuses the command.
            if let Err(err) = handle.stop() {
                debug!("Stream in guild {} was already stopped: {}", guild_id, err);
            }
        }
        Ok(())
    }

    async fn position(&self, guild_id: GuildId) -> Option<Duration> {
        let handle = self.handle(guild_id).ok()?;
        handle.get_info().await.ok().map(|state| state.position)
    }
}
