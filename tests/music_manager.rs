//! Command-level behaviour of `MusicManager` against a mocked backend

mod common;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::time::Duration;

use common::fixtures::*;
use common::manager;
use common::mocks::{Call, CallLog, MockBackend, recording_backend};
use rusty_jukebox::commands::music::utils::music_manager::{
    Enqueued, MusicError, PauseOutcome, PlayRequest,
};
use rusty_jukebox::commands::music::utils::queue_manager::LoopMode;

/// Queues every query in order, starting playback with the first.
async fn queue_up(
    manager: &rusty_jukebox::commands::music::utils::music_manager::MusicManager,
    queries: &[&str],
) {
    for query in queries {
        manager.play(guild(), request(query)).await.unwrap();
    }
}

fn titles(tracks: &[rusty_jukebox::commands::music::audio_sources::track_metadata::Track]) -> Vec<String> {
    tracks.iter().map(|t| t.title.clone()).collect()
}

/// Tests that the first `/play` connects, queues and starts the track.
#[tokio::test]
async fn test_first_play_connects_and_starts() {
    let log = CallLog::default();
    let manager = manager(recording_backend(&log));

    let outcome = manager.play(guild(), request("song a")).await.unwrap();

    assert_eq!(outcome.added, Enqueued::Track(track("song a")));
    assert_eq!(outcome.started.as_ref().map(|t| t.title.as_str()), Some("song a"));
    assert_eq!(outcome.started.unwrap().requester, Some(user()));
    assert_eq!(outcome.queue_len, 0);
    assert_matches!(log.calls(guild())[0], Call::Connect(channel_id, _) if channel_id == channel());
    assert_eq!(log.played(guild()), vec!["song a"]);
    assert!(manager.has_session(guild()));
}

/// Tests that later `/play`s only queue.
#[tokio::test]
async fn test_play_while_busy_only_queues() {
    let log = CallLog::default();
    let manager = manager(recording_backend(&log));

    queue_up(&manager, &["a", "b", "c"]).await;

    let snapshot = manager.snapshot(guild(), 10).await.unwrap();
    assert_eq!(snapshot.current.map(|t| t.title), Some("a".to_string()));
    assert_eq!(titles(&snapshot.upcoming), vec!["b", "c"]);
    assert_eq!(log.played(guild()), vec!["a"]);
    assert_eq!(log.count(guild(), |c| matches!(c, Call::Connect(..))), 1);
}

/// Tests that `/insert` puts the track in front of the queue.
#[tokio::test]
async fn test_insert_goes_to_head() {
    let log = CallLog::default();
    let manager = manager(recording_backend(&log));
    queue_up(&manager, &["a", "b", "c"]).await;

    manager.play(guild(), insert_request("urgent")).await.unwrap();

    let snapshot = manager.snapshot(guild(), 10).await.unwrap();
    assert_eq!(titles(&snapshot.upcoming), vec!["urgent", "b", "c"]);
}

/// Tests that a playlist result queues every track.
#[tokio::test]
async fn test_playlist_queues_everything() {
    let log = CallLog::default();
    let manager = manager(recording_backend(&log));

    let outcome = manager.play(guild(), request("list:mix:3")).await.unwrap();

    assert_eq!(
        outcome.added,
        Enqueued::Playlist {
            name: "mix".to_string(),
            count: 3
        }
    );
    assert_eq!(log.played(guild()), vec!["mix-1"]);
    assert_eq!(outcome.queue_len, 2);
}

/// Tests the failures that happen before any backend call.
#[rstest]
#[case::no_voice_channel(PlayRequest { voice_channel: None, ..request("a") }, MusicError::NoVoiceChannel)]
#[case::blank_query(request("   "), MusicError::InvalidArgument("Please provide something to play.".to_string()))]
#[tokio::test]
async fn test_play_rejected_early(#[case] request: PlayRequest, #[case] expected: MusicError) {
    // No expectations: any backend call panics.
    let manager = manager(MockBackend::new());

    let result = manager.play(guild(), request).await;

    assert_eq!(result.unwrap_err(), expected);
    assert!(!manager.has_session(guild()));
}

/// Tests that an empty search is reported with the query.
#[tokio::test]
async fn test_no_results() {
    let log = CallLog::default();
    let manager = manager(recording_backend(&log));

    let result = manager.play(guild(), request("none")).await;

    assert_eq!(
        result.unwrap_err(),
        MusicError::NoResults {
            query: "none".to_string()
        }
    );
    assert!(log.played(guild()).is_empty());
}

/// Tests that a failed connect leaves no session behind.
#[tokio::test]
async fn test_failed_connect_tears_down() {
    let mut backend = MockBackend::new();
    backend
        .expect_connect()
        .times(1)
        .returning(|_, _, _| Err(MusicError::BackendUnavailable("gateway down".to_string())));
    let manager = manager(backend);

    let result = manager.play(guild(), request("a")).await;

    assert_matches!(result, Err(MusicError::BackendUnavailable(_)));
    assert!(!manager.has_session(guild()));
}

/// Tests that a track the backend refuses is dropped for the next one.
#[tokio::test]
async fn test_unplayable_track_falls_through() {
    let log = CallLog::default();
    let mut backend = MockBackend::new();
    backend
        .expect_search()
        .returning(|query| Ok(search_result(query)));
    backend.expect_connect().returning(|_, _, _| Ok(()));
    let calls = log.clone();
    backend.expect_play().returning(move |guild_id, track, playback| {
        calls.push(guild_id, Call::Play(track.title.clone(), playback));
        if track.title == "mix-1" {
            Err(MusicError::BackendUnavailable("unavailable video".to_string()))
        } else {
            Ok(())
        }
    });
    let manager = manager(backend);

    let outcome = manager.play(guild(), request("list:mix:3")).await.unwrap();

    assert_eq!(outcome.started.map(|t| t.title), Some("mix-2".to_string()));
    assert_eq!(log.played(guild()), vec!["mix-1", "mix-2"]);
    assert_eq!(outcome.queue_len, 1);
}

/// Tests that a skip onto unplayable tracks reports the playback failure
/// even when stopping the old stream fails too.
#[tokio::test]
async fn test_skip_keeps_play_error() {
    let mut backend = MockBackend::new();
    backend
        .expect_search()
        .returning(|query| Ok(search_result(query)));
    backend.expect_connect().returning(|_, _, _| Ok(()));
    backend.expect_play().returning(|_, track, _| {
        if track.title == "mix-1" {
            Ok(())
        } else {
            Err(MusicError::BackendUnavailable("unavailable video".to_string()))
        }
    });
    backend
        .expect_stop()
        .times(1)
        .returning(|_| Err(MusicError::BackendUnavailable("driver gone".to_string())));
    let manager = manager(backend);
    manager.play(guild(), request("list:mix:2")).await.unwrap();

    let result = manager.skip(guild(), 1).await;

    assert_eq!(
        result.unwrap_err(),
        MusicError::BackendUnavailable("unavailable video".to_string())
    );
}

/// Tests that `/play` follows the caller into another channel.
#[tokio::test]
async fn test_play_moves_to_callers_channel() {
    let log = CallLog::default();
    let manager = manager(recording_backend(&log));
    queue_up(&manager, &["a"]).await;

    let moved = PlayRequest {
        voice_channel: Some(other_channel()),
        ..request("b")
    };
    manager.play(guild(), moved).await.unwrap();

    assert_eq!(
        log.calls(guild())
            .into_iter()
            .filter(|c| matches!(c, Call::Connect(..)))
            .collect::<Vec<_>>(),
        vec![
            Call::Connect(channel(), log.last_connection(guild())),
            Call::Connect(other_channel(), log.last_connection(guild())),
        ]
    );
}

/// Tests that `skip 3` with five queued drops two and plays the third.
#[tokio::test]
async fn test_skip_to_third() {
    let log = CallLog::default();
    let manager = manager(recording_backend(&log));
    queue_up(&manager, &["now", "q1", "q2", "q3", "q4", "q5"]).await;

    let outcome = manager.skip(guild(), 3).await.unwrap();

    assert_eq!(outcome.skipped.title, "now");
    assert_eq!(outcome.dropped, 2);
    assert_eq!(outcome.next.map(|t| t.title), Some("q3".to_string()));
    assert_eq!(log.played(guild()), vec!["now", "q3"]);
    assert_eq!(log.count(guild(), |c| *c == Call::Stop), 0);

    let snapshot = manager.snapshot(guild(), 10).await.unwrap();
    assert_eq!(titles(&snapshot.upcoming), vec!["q4", "q5"]);
}

/// Tests that a plain skip drops nothing from the queue.
#[tokio::test]
async fn test_skip_one_drops_nothing() {
    let log = CallLog::default();
    let manager = manager(recording_backend(&log));
    queue_up(&manager, &["now", "q1", "q2"]).await;

    let outcome = manager.skip(guild(), 1).await.unwrap();

    assert_eq!(outcome.dropped, 0);
    assert_eq!(log.played(guild()), vec!["now", "q1"]);
}

/// Tests that skipping the last track stops the backend.
#[tokio::test]
async fn test_skip_last_track_stops() {
    let log = CallLog::default();
    let manager = manager(recording_backend(&log));
    queue_up(&manager, &["only"]).await;

    let outcome = manager.skip(guild(), 1).await.unwrap();

    assert_eq!(outcome.next, None);
    assert_eq!(log.count(guild(), |c| *c == Call::Stop), 1);
    let snapshot = manager.snapshot(guild(), 10).await.unwrap();
    assert_eq!(snapshot.current, None);
}

/// Tests skip errors.
#[tokio::test]
async fn test_skip_errors() {
    let log = CallLog::default();
    let manager = manager(recording_backend(&log));

    assert_eq!(
        manager.skip(guild(), 1).await.unwrap_err(),
        MusicError::NotInVoice
    );

    queue_up(&manager, &["a", "b"]).await;
    assert_matches!(
        manager.skip(guild(), 0).await,
        Err(MusicError::InvalidArgument(_))
    );
    assert_eq!(log.played(guild()), vec!["a"]);
}

/// Tests that a bad `/remove` leaves the queue as it was.
#[rstest]
#[case(0)]
#[case(-1)]
#[case(3)]
#[tokio::test]
async fn test_remove_out_of_range(#[case] index: i64) {
    let log = CallLog::default();
    let manager = manager(recording_backend(&log));
    queue_up(&manager, &["now", "a", "b"]).await;

    let result = manager.remove(guild(), index).await;

    assert_eq!(
        result.unwrap_err(),
        MusicError::InvalidIndex { index, len: 2 }
    );
    let snapshot = manager.snapshot(guild(), 10).await.unwrap();
    assert_eq!(titles(&snapshot.upcoming), vec!["a", "b"]);
}

/// Tests removing and clearing.
#[tokio::test]
async fn test_remove_then_clear() {
    let log = CallLog::default();
    let manager = manager(recording_backend(&log));
    queue_up(&manager, &["now", "a", "b", "c"]).await;

    let removed = manager.remove(guild(), 2).await.unwrap();
    assert_eq!(removed.title, "b");

    assert_eq!(manager.clear(guild()).await.unwrap(), 2);
    assert_eq!(manager.clear(guild()).await.unwrap(), 0);

    let snapshot = manager.snapshot(guild(), 10).await.unwrap();
    assert!(snapshot.upcoming.is_empty());
    assert_eq!(snapshot.current.map(|t| t.title), Some("now".to_string()));
}

/// Tests pausing and resuming, including the no-op cases.
#[tokio::test]
async fn test_pause_and_resume() {
    let log = CallLog::default();
    let manager = manager(recording_backend(&log));
    queue_up(&manager, &["a"]).await;

    assert_eq!(manager.resume(guild()).await.unwrap(), PauseOutcome::AlreadyPlaying);
    assert_eq!(manager.pause(guild()).await.unwrap(), PauseOutcome::Paused);
    assert_eq!(manager.pause(guild()).await.unwrap(), PauseOutcome::AlreadyPaused);
    assert_eq!(manager.resume(guild()).await.unwrap(), PauseOutcome::Resumed);

    assert_eq!(
        log.calls(guild())
            .into_iter()
            .filter(|c| matches!(c, Call::Pause(_)))
            .collect::<Vec<_>>(),
        vec![Call::Pause(true), Call::Pause(false)]
    );
}

/// Tests that pausing with nothing loaded is an error.
#[tokio::test]
async fn test_pause_without_track() {
    let log = CallLog::default();
    let manager = manager(recording_backend(&log));
    queue_up(&manager, &["only"]).await;
    manager.skip(guild(), 1).await.unwrap();

    assert_eq!(
        manager.pause(guild()).await.unwrap_err(),
        MusicError::NoTrackLoaded
    );
}

/// Tests the now-playing view.
#[tokio::test]
async fn test_now_playing_reports_position() {
    let log = CallLog::default();
    let manager = manager(recording_backend(&log));
    queue_up(&manager, &["a"]).await;

    let info = manager.now_playing(guild()).await.unwrap();

    assert_eq!(info.track.title, "a");
    assert_eq!(info.position, Some(Duration::from_secs(30)));
    assert!(!info.paused);
}

/// Tests that the loop and shuffle flags show up in the snapshot.
#[tokio::test]
async fn test_flags_in_snapshot() {
    let log = CallLog::default();
    let manager = manager(recording_backend(&log));
    queue_up(&manager, &["a", "b", "c"]).await;

    manager.set_loop_mode(guild(), LoopMode::Queue).await.unwrap();
    assert!(manager.toggle_shuffle(guild()).await.unwrap());

    let snapshot = manager.snapshot(guild(), 1).await.unwrap();
    assert_eq!(snapshot.loop_mode, LoopMode::Queue);
    assert!(snapshot.shuffle);
    assert_eq!(snapshot.upcoming.len(), 1);
    assert_eq!(snapshot.queue_len, 2);
    assert_eq!(snapshot.total_duration, Duration::from_secs(360));
}

/// Tests that `/stop` forgets everything and a later `/play` starts over.
#[tokio::test]
async fn test_stop_then_play_again() {
    let log = CallLog::default();
    let manager = manager(recording_backend(&log));
    queue_up(&manager, &["a", "b"]).await;
    manager.set_loop_mode(guild(), LoopMode::Track).await.unwrap();

    manager.stop(guild()).await.unwrap();

    assert!(!manager.has_session(guild()));
    assert_eq!(
        manager.snapshot(guild(), 10).await.unwrap_err(),
        MusicError::NotInVoice
    );
    assert_eq!(manager.stop(guild()).await.unwrap_err(), MusicError::NotInVoice);

    manager.play(guild(), request("c")).await.unwrap();
    let snapshot = manager.snapshot(guild(), 10).await.unwrap();
    assert_eq!(snapshot.current.map(|t| t.title), Some("c".to_string()));
    assert!(snapshot.upcoming.is_empty());
    assert_eq!(snapshot.loop_mode, LoopMode::Off);
    assert_eq!(log.count(guild(), |c| matches!(c, Call::Connect(..))), 2);
    assert_eq!(log.count(guild(), |c| *c == Call::Disconnect), 1);
}

/// Tests that guilds do not see each other's queues.
#[tokio::test]
async fn test_guilds_are_isolated() {
    let log = CallLog::default();
    let manager = manager(recording_backend(&log));
    queue_up(&manager, &["a", "b"]).await;
    manager.play(other_guild(), request("x")).await.unwrap();

    manager.stop(guild()).await.unwrap();

    assert!(!manager.has_session(guild()));
    let other = manager.snapshot(other_guild(), 10).await.unwrap();
    assert_eq!(other.current.map(|t| t.title), Some("x".to_string()));
    assert_eq!(log.played(other_guild()), vec!["x"]);
}

/// Tests that concurrent `/play`s in one guild connect only once and keep
/// both tracks.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_plays_are_serialized() {
    let log = CallLog::default();
    let manager = manager(recording_backend(&log));

    let (first, second) = tokio::join!(
        manager.play(guild(), request("a")),
        manager.play(guild(), request("b"))
    );
    first.unwrap();
    second.unwrap();

    assert_eq!(log.count(guild(), |c| matches!(c, Call::Connect(..))), 1);
    assert_eq!(log.played(guild()).len(), 1);
    let snapshot = manager.snapshot(guild(), 10).await.unwrap();
    assert_eq!(snapshot.queue_len, 1);
    assert_eq!(manager.session_count(), 1);
}

/// Tests that only playlist URLs produce a playlist.
#[tokio::test]
async fn test_search_playlist() {
    let mut backend = MockBackend::new();
    backend
        .expect_search()
        .times(2)
        .returning(|query| match query {
            "https://example.com/playlist" => Ok(search_result("list:mix:2")),
            other => Ok(search_result(other)),
        });
    let manager = manager(backend);

    let playlist = manager
        .search_playlist("https://example.com/playlist")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(playlist.name, "mix");
    assert_eq!(playlist.tracks.len(), 2);

    assert_eq!(manager.search_playlist("https://example.com/a").await.unwrap(), None);
    // Not a URL, so the backend is never asked.
    assert_eq!(manager.search_playlist("lofi beats").await.unwrap(), None);
}
