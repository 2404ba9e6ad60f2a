//! Test fixtures for the jukebox
//! Sample ids, tracks and search results used across the integration tests

use std::time::Duration;

use rusty_jukebox::commands::music::audio_sources::SearchResult;
use rusty_jukebox::commands::music::audio_sources::track_metadata::{Playlist, Track};
use rusty_jukebox::commands::music::utils::music_manager::PlayRequest;
use rusty_jukebox::commands::music::utils::queue_manager::Placement;
use serenity::model::id::{ChannelId, GuildId, UserId};

pub const GUILD_ID: u64 = 111_111;
pub const OTHER_GUILD_ID: u64 = 222_222;
pub const CHANNEL_ID: u64 = 333_333;
pub const OTHER_CHANNEL_ID: u64 = 444_444;
pub const USER_ID: u64 = 555_555;

pub fn guild() -> GuildId {
    GuildId::new(GUILD_ID)
}

pub fn other_guild() -> GuildId {
    GuildId::new(OTHER_GUILD_ID)
}

pub fn channel() -> ChannelId {
    ChannelId::new(CHANNEL_ID)
}

pub fn other_channel() -> ChannelId {
    ChannelId::new(OTHER_CHANNEL_ID)
}

pub fn user() -> UserId {
    UserId::new(USER_ID)
}

/// A three-minute track whose URI is derived from its title
pub fn track(title: &str) -> Track {
    Track::new(format!("https://example.com/{}", title.replace(' ', "-")), title)
        .with_duration(Duration::from_secs(180))
}

/// What the recording backend answers for a query:
/// - `none` finds nothing
/// - `list:NAME:N` is a playlist of `N` tracks named `NAME-1` .. `NAME-N`
/// - anything else is a single track titled like the query
pub fn search_result(query: &str) -> SearchResult {
    if query == "none" {
        return SearchResult::NoMatches;
    }

    if let Some(spec) = query.strip_prefix("list:") {
        let (name, count) = spec.split_once(':').unwrap_or((spec, "0"));
        let count: usize = count.parse().unwrap_or(0);
        return SearchResult::Playlist(Playlist {
            name: name.to_string(),
            url: Some(format!("https://example.com/playlist/{}", name)),
            artwork_url: None,
            tracks: (1..=count)
                .map(|n| track(&format!("{}-{}", name, n)))
                .collect(),
        });
    }

    SearchResult::Track(track(query))
}

/// A `/play` request from a user sitting in `channel()`
pub fn request(query: &str) -> PlayRequest {
    PlayRequest {
        query: query.to_string(),
        requester: user(),
        voice_channel: Some(channel()),
        placement: Placement::Tail,
    }
}

/// A `/insert` request from a user sitting in `channel()`
pub fn insert_request(query: &str) -> PlayRequest {
    PlayRequest {
        placement: Placement::Head,
        ..request(query)
    }
}
