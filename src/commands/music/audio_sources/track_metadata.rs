//! Defines the `Track` and `Playlist` types, the resolved form of a search
//! result, and the conversion from `yt-dlp` JSON documents.

use crate::commands::music::utils::format_duration;
use crate::commands::music::utils::music_manager::MusicError;
use serde::Deserialize;
use serenity::model::id::UserId;
use std::fmt;
use std::time::Duration;

/// Title used when a source does not report one.
const UNKNOWN_TITLE: &str = "Unknown Title";

/// A playable audio reference with its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// The URI the backend streams from.
    pub uri: String,
    /// The title of the track.
    pub title: String,
    /// The duration of the track, if known (live streams have none).
    pub duration: Option<Duration>,
    /// URL to an artwork/thumbnail image, if available.
    pub artwork_url: Option<String>,
    /// The user who asked for the track.
    pub requester: Option<UserId>,
}

impl Track {
    /// Creates a track with no optional metadata.
    pub fn new(uri: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            title: title.into(),
            duration: None,
            artwork_url: None,
            requester: None,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_artwork(mut self, artwork_url: impl Into<String>) -> Self {
        self.artwork_url = Some(artwork_url.into());
        self
    }

    pub fn with_requester(mut self, requester: UserId) -> Self {
        self.requester = Some(requester);
        self
    }

    /// The duration formatted for display, or `"live"` when unknown.
    pub fn length_string(&self) -> String {
        self.duration
            .map(format_duration)
            .unwrap_or_else(|| "live".to_string())
    }
}

/// Markdown link to the track, as shown in embeds.
impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]({})", self.title, self.uri)
    }
}

/// An ordered collection of tracks resolved from a playlist URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    pub name: String,
    pub url: Option<String>,
    pub artwork_url: Option<String>,
    pub tracks: Vec<Track>,
}

impl Playlist {
    pub fn total_duration(&self) -> Duration {
        self.tracks.iter().filter_map(|track| track.duration).sum()
    }
}

/// A thumbnail entry in `yt-dlp` output.
#[derive(Debug, Deserialize)]
pub(crate) struct YtDlpThumbnail {
    pub url: String,
}

/// A `yt-dlp -J --flat-playlist` document. Videos, playlists and flat
/// playlist entries all share this shape with different fields present.
#[derive(Debug, Deserialize)]
pub(crate) struct YtDlpEntry {
    #[serde(rename = "_type")]
    pub kind: Option<String>,
    pub title: Option<String>,
    pub duration: Option<f64>,
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub thumbnails: Vec<YtDlpThumbnail>,
    pub webpage_url: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub entries: Vec<YtDlpEntry>,
}

impl YtDlpEntry {
    pub fn is_playlist(&self) -> bool {
        self.kind.as_deref() == Some("playlist")
    }

    /// The best artwork available. `yt-dlp` lists thumbnails from lowest to
    /// highest resolution.
    fn artwork(&self) -> Option<String> {
        self.thumbnail
            .clone()
            .or_else(|| self.thumbnails.last().map(|thumb| thumb.url.clone()))
    }

    /// Converts a playlist document. Entries without a usable URL are dropped.
    pub fn into_playlist(self) -> Playlist {
        let artwork_url = self.artwork();
        let tracks = self
            .entries
            .into_iter()
            .filter_map(|entry| Track::try_from(entry).ok())
            .collect();

        Playlist {
            name: self.title.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            url: self.webpage_url,
            artwork_url,
            tracks,
        }
    }
}

/// Converts a single video document (or flat playlist entry) into a `Track`.
/// Fails when the entry carries no URL to stream from.
impl TryFrom<YtDlpEntry> for Track {
    type Error = MusicError;

    fn try_from(entry: YtDlpEntry) -> Result<Self, Self::Error> {
        let artwork_url = entry.artwork();
        let uri = entry.webpage_url.or(entry.url).ok_or_else(|| {
            MusicError::BackendUnavailable("search result has no playable URL".to_string())
        })?;

        // Live streams report no (or a nonsensical) duration.
        let duration = entry
            .duration
            .filter(|secs| *secs > 0.0)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok());

        Ok(Track {
            uri,
            title: entry.title.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            duration,
            artwork_url,
            requester: None,
        })
    }
}
