//! Per-guild playback state: the track queue, the current track and the
//! loop/shuffle/pause flags.
//!
//! `PlaybackSession` is purely in-memory and knows nothing about Discord or
//! the audio backend. `MusicManager` owns one per guild and translates its
//! decisions into backend calls.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serenity::model::id::ChannelId;
use tracing::debug;

use super::music_manager::{MusicError, MusicResult};
use crate::commands::music::audio_sources::track_metadata::Track;

/// Voice connection state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected(ChannelId),
}

/// Identifies the voice connection owned by one session. Disconnect
/// notices carry it so that a notice about an earlier session is not
/// applied to its successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Identifies one backend stream. Every call to `PlaybackSession::start`
/// hands out a fresh id, so events about earlier streams can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaybackId(pub u64);

impl fmt::Display for PlaybackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What happens to a track once it has played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    #[default]
    Off,
    /// Replay the current track.
    Track,
    /// Send finished tracks to the back of the queue.
    Queue,
}

impl fmt::Display for LoopMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LoopMode::Off => "Off",
            LoopMode::Track => "Track",
            LoopMode::Queue => "Queue",
        };
        f.write_str(label)
    }
}

/// Where new tracks go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    #[default]
    Tail,
    Head,
}

/// Why the current track stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackEnd {
    /// The stream played to completion (or failed and is treated as done).
    Finished,
    /// A user asked to move past it.
    Skipped,
}

/// The track the backend is streaming and the id of that stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlaying {
    pub track: Track,
    pub id: PlaybackId,
}

/// Playback state for a single guild.
#[derive(Debug)]
pub struct PlaybackSession {
    connection_id: ConnectionId,
    connection: ConnectionState,
    current: Option<NowPlaying>,
    queue: VecDeque<Track>,
    paused: bool,
    loop_mode: LoopMode,
    shuffle: bool,
    next_id: u64,
    rng: StdRng,
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackSession {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Creates a session whose shuffle picks are reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            connection_id: ConnectionId::default(),
            connection: ConnectionState::Disconnected,
            current: None,
            queue: VecDeque::new(),
            paused: false,
            loop_mode: LoopMode::Off,
            shuffle: false,
            next_id: 0,
            rng,
        }
    }

    pub fn with_connection_id(mut self, id: ConnectionId) -> Self {
        self.connection_id = id;
        self
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn set_connection(&mut self, state: ConnectionState) {
        self.connection = state;
    }

    /// The channel the bot sits in, once connected.
    pub fn channel(&self) -> Option<ChannelId> {
        match self.connection {
            ConnectionState::Connected(channel_id) => Some(channel_id),
            _ => None,
        }
    }

    pub fn current(&self) -> Option<&NowPlaying> {
        self.current.as_ref()
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current.as_ref().map(|now| &now.track)
    }

    /// Whether `id` names the stream that is playing right now.
    pub fn is_current(&self, id: PlaybackId) -> bool {
        self.current.as_ref().is_some_and(|now| now.id == id)
    }

    pub fn queue(&self) -> &VecDeque<Track> {
        &self.queue
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    pub fn set_loop_mode(&mut self, mode: LoopMode) {
        debug!("Loop mode {} -> {}", self.loop_mode, mode);
        self.loop_mode = mode;
    }

    pub fn is_shuffle(&self) -> bool {
        self.shuffle
    }

    /// Flips shuffle and returns the new state. The stored order is untouched.
    pub fn toggle_shuffle(&mut self) -> bool {
        self.shuffle = !self.shuffle;
        debug!("Shuffle toggled to {}", self.shuffle);
        self.shuffle
    }

    /// Sum of the known durations of the queued tracks.
    pub fn total_duration(&self) -> Duration {
        self.queue.iter().filter_map(|track| track.duration).sum()
    }

    /// Adds tracks to the queue and returns how many were added.
    ///
    /// Tracks inserted at the head keep their relative order, so inserting
    /// `[a, b]` in front of `[c]` yields `[a, b, c]`.
    pub fn enqueue<I>(&mut self, tracks: I, placement: Placement) -> usize
    where
        I: IntoIterator<Item = Track>,
    {
        let added = match placement {
            Placement::Tail => {
                let before = self.queue.len();
                self.queue.extend(tracks);
                self.queue.len() - before
            }
            Placement::Head => {
                let tracks: Vec<Track> = tracks.into_iter().collect();
                let count = tracks.len();
                for track in tracks.into_iter().rev() {
                    self.queue.push_front(track);
                }
                count
            }
        };

        debug!(
            "Enqueued {} track(s) at {:?}, queue length now {}",
            added,
            placement,
            self.queue.len()
        );
        added
    }

    /// Takes the next track to play: a uniformly random one when shuffle is
    /// on, otherwise the head.
    pub fn dequeue_next(&mut self) -> Option<Track> {
        if self.queue.is_empty() {
            return None;
        }

        if self.shuffle {
            let index = self.rng.gen_range(0..self.queue.len());
            self.queue.remove(index)
        } else {
            self.queue.pop_front()
        }
    }

    /// Removes the track at a 1-based position. The queue is left unchanged
    /// when the position is out of range.
    pub fn remove_at(&mut self, position: i64) -> MusicResult<Track> {
        let len = self.queue.len();
        let removed = usize::try_from(position)
            .ok()
            .filter(|position| (1..=len).contains(position))
            .and_then(|position| self.queue.remove(position - 1))
            .ok_or(MusicError::InvalidIndex {
                index: position,
                len,
            })?;
        debug!("Removed '{}' from position {}", removed.title, position);
        Ok(removed)
    }

    /// Drops the tracks queued before the `n`th one, stopping early when the
    /// queue runs out, and returns how many were dropped. The caller still
    /// has to move past the current track.
    pub fn skip_to(&mut self, n: i64) -> MusicResult<usize> {
        if n < 1 {
            return Err(MusicError::InvalidArgument(format!(
                "Skip count must be at least 1, got {}",
                n
            )));
        }

        let wanted = usize::try_from(n - 1).unwrap_or(usize::MAX);
        let dropped = wanted.min(self.queue.len());
        self.queue.drain(..dropped);
        debug!("Skipping ahead: dropped {} queued track(s)", dropped);
        Ok(dropped)
    }

    /// Empties the queue and returns how many tracks it held.
    pub fn clear(&mut self) -> usize {
        let cleared = self.queue.len();
        self.queue.clear();
        cleared
    }

    /// Marks `track` as playing and returns the id of its stream.
    pub fn start(&mut self, track: Track) -> PlaybackId {
        self.next_id += 1;
        let id = PlaybackId(self.next_id);
        debug!("Starting '{}' as stream {}", track.title, id);
        self.current = Some(NowPlaying { track, id });
        self.paused = false;
        id
    }

    /// Retires the current track and picks the one to play next.
    ///
    /// A finished track is replayed under `LoopMode::Track`. Under
    /// `LoopMode::Queue` the retired track goes to the back of the queue
    /// whether it finished or was skipped. Afterwards `current` is empty
    /// until the caller starts the returned track.
    pub fn finish(&mut self, cause: TrackEnd) -> Option<Track> {
        self.paused = false;

        if let Some(NowPlaying { track, .. }) = self.current.take() {
            match (self.loop_mode, cause) {
                (LoopMode::Track, TrackEnd::Finished) => return Some(track),
                (LoopMode::Queue, _) => self.queue.push_back(track),
                _ => {}
            }
        }

        self.dequeue_next()
    }

    /// Drops the current track without applying the loop rules, for streams
    /// that could not be started at all.
    pub fn abandon(&mut self) -> Option<Track> {
        self.paused = false;
        self.current.take().map(|now| now.track)
    }

    /// Resets the session to its freshly created state.
    pub fn teardown(&mut self) {
        self.queue.clear();
        self.current = None;
        self.paused = false;
        self.loop_mode = LoopMode::Off;
        self.shuffle = false;
        self.connection = ConnectionState::Disconnected;
    }
}
