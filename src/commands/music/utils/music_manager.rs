use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use serenity::model::id::{ChannelId, GuildId, UserId};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use super::backend::{AudioBackend, BackendEvent};
use super::queue_manager::{
    ConnectionId, ConnectionState, LoopMode, PlaybackId, PlaybackSession, Placement, TrackEnd,
};
use crate::commands::music::audio_sources::track_metadata::{Playlist, Track};
use crate::commands::music::audio_sources::{AudioSource, SearchResult};

/// Errors that can occur during music operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MusicError {
    #[error("This command can only be used in a server.")]
    NotInGuild,

    #[error("I am not in a voice channel.")]
    NotInVoice,

    #[error("You are not in a voice channel.")]
    NoVoiceChannel,

    #[error("There is no track at position {index}, the queue holds {len}.")]
    InvalidIndex { index: i64, len: usize },

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Audio backend error: {0}")]
    BackendUnavailable(String),

    #[error("Nothing is playing right now.")]
    NoTrackLoaded,

    #[error("No results found for `{query}`.")]
    NoResults { query: String },
}

/// Result type for music operations
pub type MusicResult<T> = Result<T, MusicError>;

type SessionGuard = OwnedMutexGuard<PlaybackSession>;

/// A `/play` or `/insert` invocation.
#[derive(Debug, Clone)]
pub struct PlayRequest {
    pub query: String,
    pub requester: UserId,
    /// The voice channel the caller sits in, if any.
    pub voice_channel: Option<ChannelId>,
    pub placement: Placement,
}

/// What a search added to the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enqueued {
    Track(Track),
    Playlist { name: String, count: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayOutcome {
    pub added: Enqueued,
    /// Set when the queue was idle and playback started.
    pub started: Option<Track>,
    pub queue_len: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseOutcome {
    Paused,
    AlreadyPaused,
    Resumed,
    AlreadyPlaying,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipOutcome {
    pub skipped: Track,
    /// Queued tracks dropped on the way.
    pub dropped: usize,
    pub next: Option<Track>,
}

/// A read-only view of a session for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSnapshot {
    pub current: Option<Track>,
    /// The first tracks of the queue, in play order when shuffle is off.
    pub upcoming: Vec<Track>,
    pub queue_len: usize,
    pub total_duration: Duration,
    pub loop_mode: LoopMode,
    pub shuffle: bool,
    pub paused: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlayingInfo {
    pub track: Track,
    pub position: Option<Duration>,
    pub paused: bool,
}

/// Owns the playback session of every guild and drives the audio backend.
///
/// Each session sits behind its own mutex, held for the whole of a command
/// or backend event, so work on one guild is serialized while guilds run
/// independently.
pub struct MusicManager {
    sessions: DashMap<GuildId, Arc<Mutex<PlaybackSession>>>,
    backend: Arc<dyn AudioBackend>,
    // Source of session connection ids, unique for the manager's lifetime
    next_connection: AtomicU64,
}

impl MusicManager {
    pub fn new(backend: Arc<dyn AudioBackend>) -> Self {
        Self {
            sessions: DashMap::new(),
            backend,
            next_connection: AtomicU64::new(1),
        }
    }

    pub fn has_session(&self, guild_id: GuildId) -> bool {
        self.sessions.contains_key(&guild_id)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Locks the session of a guild, creating it when `create` is set.
    ///
    /// A session removed while we waited for its lock is never handed out:
    /// either a fresh one is created or `NotInVoice` is returned.
    async fn lock_session(&self, guild_id: GuildId, create: bool) -> MusicResult<SessionGuard> {
        loop {
            let session = if create {
                self.sessions
                    .entry(guild_id)
                    .or_insert_with(|| {
                        let id = ConnectionId(self.next_connection.fetch_add(1, Ordering::Relaxed));
                        debug!("Creating playback session {} for guild {}", id, guild_id);
                        Arc::new(Mutex::new(PlaybackSession::new().with_connection_id(id)))
                    })
                    .clone()
            } else {
                self.sessions
                    .get(&guild_id)
                    .map(|session| session.clone())
                    .ok_or(MusicError::NotInVoice)?
            };

            let guard = session.clone().lock_owned().await;

            let live = self
                .sessions
                .get(&guild_id)
                .is_some_and(|current| Arc::ptr_eq(current.value(), &session));
            if live {
                return Ok(guard);
            }
            if !create {
                return Err(MusicError::NotInVoice);
            }
        }
    }

    /// Tears the session down and forgets it.
    fn discard(&self, guild_id: GuildId, session: &mut SessionGuard) {
        session.teardown();
        let owner = OwnedMutexGuard::mutex(session);
        self.sessions
            .remove_if(&guild_id, |_, current| Arc::ptr_eq(current, owner));
        info!("Playback session for guild {} torn down", guild_id);
    }

    /// Makes sure the bot sits in `channel_id`, joining or moving as needed.
    async fn ensure_connected(
        &self,
        guild_id: GuildId,
        session: &mut SessionGuard,
        channel_id: ChannelId,
    ) -> MusicResult<()> {
        match session.connection() {
            ConnectionState::Connected(current) if current == channel_id => return Ok(()),
            ConnectionState::Connected(current) => {
                info!(
                    "Moving from channel {} to {} in guild {}",
                    current, channel_id, guild_id
                );
            }
            _ => session.set_connection(ConnectionState::Connecting),
        }

        let connection = session.connection_id();
        if let Err(err) = self.backend.connect(guild_id, channel_id, connection).await {
            error!("Failed to connect in guild {}: {}", guild_id, err);
            self.discard(guild_id, session);
            return Err(err);
        }

        session.set_connection(ConnectionState::Connected(channel_id));
        Ok(())
    }

    /// Moves playback on to the next track and starts it on the backend.
    ///
    /// With a `cause` the current track is retired through the loop rules
    /// first. Tracks the backend refuses are dropped and the next one is
    /// tried; the last failure is returned if none could be started.
    async fn advance(
        &self,
        guild_id: GuildId,
        session: &mut PlaybackSession,
        cause: Option<TrackEnd>,
    ) -> MusicResult<Option<Track>> {
        let mut next = match cause {
            Some(cause) => session.finish(cause),
            None => session.dequeue_next(),
        };
        let mut last_error = None;

        while let Some(track) = next {
            let playback = session.start(track.clone());
            match self.backend.play(guild_id, &track, playback).await {
                Ok(()) => return Ok(Some(track)),
                Err(err) => {
                    warn!(
                        "Failed to start '{}' in guild {}: {}",
                        track.title, guild_id, err
                    );
                    session.abandon();
                    last_error = Some(err);
                    next = session.dequeue_next();
                }
            }
        }

        match last_error {
            Some(err) => Err(err),
            None => {
                info!("Queue finished for guild {}", guild_id);
                Ok(None)
            }
        }
    }

    /// Searches for `request.query`, queues the result and starts playback
    /// when nothing is playing. Connects to (or moves to) the caller's voice
    /// channel first.
    #[instrument(skip(self, request), fields(query = %request.query))]
    pub async fn play(&self, guild_id: GuildId, request: PlayRequest) -> MusicResult<PlayOutcome> {
        let channel_id = request.voice_channel.ok_or(MusicError::NoVoiceChannel)?;
        let query = request.query.trim();
        if query.is_empty() {
            return Err(MusicError::InvalidArgument(
                "Please provide something to play.".to_string(),
            ));
        }

        let mut session = self.lock_session(guild_id, true).await?;
        self.ensure_connected(guild_id, &mut session, channel_id)
            .await?;

        let no_results = || MusicError::NoResults {
            query: query.to_string(),
        };
        let (added, tracks) = match self.backend.search(query).await? {
            SearchResult::Track(track) => (Enqueued::Track(track.clone()), vec![track]),
            SearchResult::Playlist(playlist) if !playlist.tracks.is_empty() => (
                Enqueued::Playlist {
                    name: playlist.name,
                    count: playlist.tracks.len(),
                },
                playlist.tracks,
            ),
            SearchResult::Playlist(_) | SearchResult::NoMatches => return Err(no_results()),
        };

        let tracks = tracks
            .into_iter()
            .map(|track| track.with_requester(request.requester));
        session.enqueue(tracks, request.placement);

        let started = if session.current().is_none() {
            self.advance(guild_id, &mut session, None).await?
        } else {
            None
        };

        Ok(PlayOutcome {
            added,
            started,
            queue_len: session.len(),
        })
    }

    pub async fn pause(&self, guild_id: GuildId) -> MusicResult<PauseOutcome> {
        self.set_paused(guild_id, true).await
    }

    pub async fn resume(&self, guild_id: GuildId) -> MusicResult<PauseOutcome> {
        self.set_paused(guild_id, false).await
    }

    async fn set_paused(&self, guild_id: GuildId, paused: bool) -> MusicResult<PauseOutcome> {
        let mut session = self.lock_session(guild_id, false).await?;
        if session.current().is_none() {
            return Err(MusicError::NoTrackLoaded);
        }

        if session.is_paused() == paused {
            return Ok(if paused {
                PauseOutcome::AlreadyPaused
            } else {
                PauseOutcome::AlreadyPlaying
            });
        }

        self.backend.pause(guild_id, paused).await?;
        session.set_paused(paused);
        debug!("Guild {} paused: {}", guild_id, paused);

        Ok(if paused {
            PauseOutcome::Paused
        } else {
            PauseOutcome::Resumed
        })
    }

    /// Skips the current track and the `count - 1` tracks queued after it.
    pub async fn skip(&self, guild_id: GuildId, count: i64) -> MusicResult<SkipOutcome> {
        let mut session = self.lock_session(guild_id, false).await?;
        let skipped = session
            .current_track()
            .cloned()
            .ok_or(MusicError::NoTrackLoaded)?;

        let dropped = session.skip_to(count)?;
        let next = match self.advance(guild_id, &mut session, Some(TrackEnd::Skipped)).await {
            Ok(next) => next,
            Err(err) => {
                if let Err(stop_err) = self.backend.stop(guild_id).await {
                    warn!("Failed to stop playback in guild {}: {}", guild_id, stop_err);
                }
                return Err(err);
            }
        };

        // Starting a new stream replaces the old one, so only an empty queue
        // needs an explicit stop.
        if next.is_none() {
            self.backend.stop(guild_id).await?;
        }

        info!(
            "Skipped '{}' and {} queued track(s) in guild {}",
            skipped.title, dropped, guild_id
        );
        Ok(SkipOutcome {
            skipped,
            dropped,
            next,
        })
    }

    /// Removes the track at a 1-based queue position.
    pub async fn remove(&self, guild_id: GuildId, position: i64) -> MusicResult<Track> {
        let mut session = self.lock_session(guild_id, false).await?;
        session.remove_at(position)
    }

    /// Empties the queue and returns how many tracks it held.
    pub async fn clear(&self, guild_id: GuildId) -> MusicResult<usize> {
        let mut session = self.lock_session(guild_id, false).await?;
        Ok(session.clear())
    }

    pub async fn set_loop_mode(&self, guild_id: GuildId, mode: LoopMode) -> MusicResult<()> {
        let mut session = self.lock_session(guild_id, false).await?;
        session.set_loop_mode(mode);
        Ok(())
    }

    /// Flips shuffle and returns the new state.
    pub async fn toggle_shuffle(&self, guild_id: GuildId) -> MusicResult<bool> {
        let mut session = self.lock_session(guild_id, false).await?;
        Ok(session.toggle_shuffle())
    }

    /// The current track and the first `limit` queued ones.
    pub async fn snapshot(&self, guild_id: GuildId, limit: usize) -> MusicResult<QueueSnapshot> {
        let session = self.lock_session(guild_id, false).await?;
        Ok(QueueSnapshot {
            current: session.current_track().cloned(),
            upcoming: session.queue().iter().take(limit).cloned().collect(),
            queue_len: session.len(),
            total_duration: session.total_duration(),
            loop_mode: session.loop_mode(),
            shuffle: session.is_shuffle(),
            paused: session.is_paused(),
        })
    }

    pub async fn now_playing(&self, guild_id: GuildId) -> MusicResult<NowPlayingInfo> {
        let session = self.lock_session(guild_id, false).await?;
        let track = session
            .current_track()
            .cloned()
            .ok_or(MusicError::NoTrackLoaded)?;
        let position = self.backend.position(guild_id).await;

        Ok(NowPlayingInfo {
            track,
            position,
            paused: session.is_paused(),
        })
    }

    /// Ends playback, forgets the session and leaves the voice channel.
    #[instrument(skip(self))]
    pub async fn stop(&self, guild_id: GuildId) -> MusicResult<()> {
        let mut session = self.lock_session(guild_id, false).await?;
        self.discard(guild_id, &mut session);

        if let Err(err) = self.backend.stop(guild_id).await {
            warn!("Failed to stop playback in guild {}: {}", guild_id, err);
        }
        self.backend.disconnect(guild_id).await
    }

    /// Resolves a playlist URL. Anything that is not a playlist gives `None`.
    pub async fn search_playlist(&self, url: &str) -> MusicResult<Option<Playlist>> {
        if !AudioSource::is_url(url.trim()) {
            return Ok(None);
        }

        match self.backend.search(url.trim()).await? {
            SearchResult::Playlist(playlist) => Ok(Some(playlist)),
            SearchResult::Track(_) | SearchResult::NoMatches => Ok(None),
        }
    }

    /// Applies a backend notification to the affected session.
    pub async fn handle_event(&self, event: BackendEvent) {
        match event {
            BackendEvent::TrackEnded { guild_id, playback } => {
                self.track_stopped(guild_id, playback, TrackEnd::Finished)
                    .await;
            }
            BackendEvent::TrackErrored {
                guild_id,
                playback,
                reason,
            } => {
                warn!(
                    "Stream {} failed in guild {}: {}",
                    playback, guild_id, reason
                );
                self.track_stopped(guild_id, playback, TrackEnd::Skipped)
                    .await;
            }
            BackendEvent::Disconnected {
                guild_id,
                connection,
            } => {
                let Ok(mut session) = self.lock_session(guild_id, false).await else {
                    debug!("Disconnect for guild {} without a session", guild_id);
                    return;
                };
                if session.connection_id() != connection {
                    debug!(
                        "Ignoring disconnect of connection {} in guild {}, session owns {}",
                        connection,
                        guild_id,
                        session.connection_id()
                    );
                    return;
                }
                self.discard(guild_id, &mut session);
                if let Err(err) = self.backend.disconnect(guild_id).await {
                    warn!("Failed to clean up voice state for guild {}: {}", guild_id, err);
                }
            }
        }
    }

    async fn track_stopped(&self, guild_id: GuildId, playback: PlaybackId, cause: TrackEnd) {
        let Ok(mut session) = self.lock_session(guild_id, false).await else {
            debug!("Track event for guild {} without a session", guild_id);
            return;
        };

        if !session.is_current(playback) {
            debug!(
                "Ignoring stale event for stream {} in guild {}",
                playback, guild_id
            );
            return;
        }

        if let Err(err) = self.advance(guild_id, &mut session, Some(cause)).await {
            error!("Failed to continue playback in guild {}: {}", guild_id, err);
        }
    }

    /// Consumes backend events until the sending side is dropped.
    pub fn listen(self: Arc<Self>, mut events: UnboundedReceiver<BackendEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("Listening for backend events");
            while let Some(event) = events.recv().await {
                debug!("Backend event: {:?}", event);
                // Events for one guild must not wait behind a slow command in another.
                let manager = Arc::clone(&self);
                tokio::spawn(async move { manager.handle_event(event).await });
            }
            info!("Backend event channel closed");
        })
    }
}
