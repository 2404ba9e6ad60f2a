//! Resolves queries with the `yt-dlp` command-line tool.
//!
//! URLs are handed over as-is; free text is prefixed with the configured
//! search provider (e.g. `ytsearch1:`) and collapsed to its best match.

use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use super::track_metadata::{Track, YtDlpEntry};
use super::{AudioSource, SearchResult};
use crate::commands::music::utils::music_manager::{MusicError, MusicResult};

/// Invokes `yt-dlp` to turn a query into tracks.
#[derive(Debug, Clone)]
pub struct YoutubeApi {
    /// Path (or name on `PATH`) of the `yt-dlp` executable.
    ytdlp_path: String,
    /// Provider prefix for free-text searches, without the trailing colon.
    search_prefix: String,
}

impl YoutubeApi {
    pub fn new(ytdlp_path: impl Into<String>, search_prefix: impl Into<String>) -> Self {
        Self {
            ytdlp_path: ytdlp_path.into(),
            search_prefix: search_prefix.into(),
        }
    }

    /// The argument `yt-dlp` receives for a query.
    fn target(&self, query: &str) -> String {
        if AudioSource::is_url(query) {
            query.to_string()
        } else {
            format!("{}:{}", self.search_prefix, query)
        }
    }

    /// Resolves a URL or search query.
    #[instrument(skip(self))]
    pub async fn resolve(&self, query: &str) -> MusicResult<SearchResult> {
        let query = query.trim();
        if query.is_empty() {
            return Err(MusicError::InvalidArgument(
                "The search query is empty".to_string(),
            ));
        }

        let target = self.target(query);
        info!("Resolving '{}' with {}", target, self.ytdlp_path);

        let output = Command::new(&self.ytdlp_path)
            .args([
                "-J",              // Single JSON document
                "--flat-playlist", // Don't resolve every playlist entry
                "--no-warnings",
                "--ignore-config",
                &target,
            ])
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| MusicError::BackendUnavailable(format!("Failed to run yt-dlp: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("yt-dlp exited with {}: {}", output.status, stderr.trim());
            return Err(MusicError::BackendUnavailable(
                "Failed to load track.".to_string(),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_search_output(&stdout, AudioSource::is_url(query))
    }
}

/// Interprets the JSON document printed by `yt-dlp -J --flat-playlist`.
///
/// A text search comes back as a playlist of matches and is collapsed to
/// its first entry; a playlist URL keeps every entry.
pub fn parse_search_output(json: &str, is_url: bool) -> MusicResult<SearchResult> {
    if json.trim().is_empty() {
        return Ok(SearchResult::NoMatches);
    }

    let document: YtDlpEntry = serde_json::from_str(json).map_err(|e| {
        MusicError::BackendUnavailable(format!("Failed to parse yt-dlp output: {}", e))
    })?;

    if !document.is_playlist() {
        return Track::try_from(document).map(SearchResult::Track);
    }

    let playlist = document.into_playlist();
    debug!(
        "yt-dlp returned playlist '{}' with {} entries",
        playlist.name,
        playlist.tracks.len()
    );

    if is_url {
        if playlist.tracks.is_empty() {
            Ok(SearchResult::NoMatches)
        } else {
            Ok(SearchResult::Playlist(playlist))
        }
    } else {
        Ok(playlist
            .tracks
            .into_iter()
            .next()
            .map_or(SearchResult::NoMatches, SearchResult::Track))
    }
}
