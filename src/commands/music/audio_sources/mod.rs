//! Resolution of user queries into playable tracks.
//! A query is either a URL (resolved as-is) or free text (handed to the
//! configured search provider).

/// Submodule defining the `Track` and `Playlist` types.
pub mod track_metadata;
/// Submodule resolving queries through `yt-dlp`.
pub mod youtube;

use track_metadata::{Playlist, Track};
use url::Url;

/// The outcome of resolving a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchResult {
    /// A single track (a video URL, or the best match of a text search).
    Track(Track),
    /// Every track of a playlist URL.
    Playlist(Playlist),
    /// Nothing matched.
    NoMatches,
}

/// A utility struct providing general helper functions related to audio sources.
pub struct AudioSource;

impl AudioSource {
    /// Performs a basic check if the input string can be parsed as a URL.
    /// Does not validate if the URL is actually reachable or supported.
    pub fn is_url(input: &str) -> bool {
        Url::parse(input).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
    }
}
