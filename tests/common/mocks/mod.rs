//! Mock implementations for external dependencies
//! The audio backend is mocked with mockall; `recording_backend` builds one
//! that accepts everything and logs each call.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mockall::mock;
use rusty_jukebox::commands::music::audio_sources::SearchResult;
use rusty_jukebox::commands::music::audio_sources::track_metadata::Track;
use rusty_jukebox::commands::music::utils::backend::AudioBackend;
use rusty_jukebox::commands::music::utils::music_manager::MusicResult;
use rusty_jukebox::commands::music::utils::queue_manager::{ConnectionId, PlaybackId};
use serenity::model::id::{ChannelId, GuildId};

use super::fixtures::search_result;

mock! {
    pub Backend {}

    #[async_trait]
    impl AudioBackend for Backend {
        async fn search(&self, query: &str) -> MusicResult<SearchResult>;
        async fn connect(&self, guild_id: GuildId, channel_id: ChannelId, connection: ConnectionId) -> MusicResult<()>;
        async fn disconnect(&self, guild_id: GuildId) -> MusicResult<()>;
        async fn play(&self, guild_id: GuildId, track: &Track, playback: PlaybackId) -> MusicResult<()>;
        async fn pause(&self, guild_id: GuildId, paused: bool) -> MusicResult<()>;
        async fn stop(&self, guild_id: GuildId) -> MusicResult<()>;
        async fn position(&self, guild_id: GuildId) -> Option<Duration>;
    }
}

/// A backend call, as seen by the recording backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect(ChannelId, ConnectionId),
    Disconnect,
    Play(String, PlaybackId),
    Pause(bool),
    Stop,
}

/// Shared, ordered record of backend calls
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<(GuildId, Call)>>>);

impl CallLog {
    pub fn push(&self, guild_id: GuildId, call: Call) {
        self.0.lock().unwrap().push((guild_id, call));
    }

    /// Every call made for `guild_id`, oldest first
    pub fn calls(&self, guild_id: GuildId) -> Vec<Call> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|(guild, _)| *guild == guild_id)
            .map(|(_, call)| call.clone())
            .collect()
    }

    /// Titles passed to `play`, oldest first
    pub fn played(&self, guild_id: GuildId) -> Vec<String> {
        self.calls(guild_id)
            .into_iter()
            .filter_map(|call| match call {
                Call::Play(title, _) => Some(title),
                _ => None,
            })
            .collect()
    }

    /// The stream id of the most recent `play`
    pub fn last_playback(&self, guild_id: GuildId) -> PlaybackId {
        self.calls(guild_id)
            .into_iter()
            .rev()
            .find_map(|call| match call {
                Call::Play(_, playback) => Some(playback),
                _ => None,
            })
            .expect("nothing was played")
    }

    /// The connection id of the most recent `connect`
    pub fn last_connection(&self, guild_id: GuildId) -> ConnectionId {
        self.calls(guild_id)
            .into_iter()
            .rev()
            .find_map(|call| match call {
                Call::Connect(_, connection) => Some(connection),
                _ => None,
            })
            .expect("never connected")
    }

    pub fn count(&self, guild_id: GuildId, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls(guild_id).iter().filter(|call| matches(call)).count()
    }
}

/// A backend that accepts every call, answers searches from
/// `fixtures::search_result` and reports a position of 30 seconds.
pub fn recording_backend(log: &CallLog) -> MockBackend {
    let mut backend = MockBackend::new();

    backend
        .expect_search()
        .returning(|query| Ok(search_result(query)));

    let calls = log.clone();
    backend
        .expect_connect()
        .returning(move |guild_id, channel_id, connection| {
            calls.push(guild_id, Call::Connect(channel_id, connection));
            Ok(())
        });

    let calls = log.clone();
    backend.expect_disconnect().returning(move |guild_id| {
        calls.push(guild_id, Call::Disconnect);
        Ok(())
    });

    let calls = log.clone();
    backend
        .expect_play()
        .returning(move |guild_id, track, playback| {
            calls.push(guild_id, Call::Play(track.title.clone(), playback));
            Ok(())
        });

    let calls = log.clone();
    backend.expect_pause().returning(move |guild_id, paused| {
        calls.push(guild_id, Call::Pause(paused));
        Ok(())
    });

    let calls = log.clone();
    backend.expect_stop().returning(move |guild_id| {
        calls.push(guild_id, Call::Stop);
        Ok(())
    });

    backend
        .expect_position()
        .returning(|_| Some(Duration::from_secs(30)));

    backend
}
