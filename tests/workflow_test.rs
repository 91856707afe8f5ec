//! End-to-end flows composing capture, library and feed

use duocam::capture::{CaptureSessionController, OutcomeSource};
use duocam::config::{CaptureConfig, DuoCamConfig};
use duocam::feed::{FeedSource, MockFeedSource};
use duocam::library::open_library;
use duocam::testing::SyntheticCaptureBackend;
use std::time::Duration;

fn config_in(dir: &std::path::Path) -> DuoCamConfig {
    let mut config = DuoCamConfig::default();
    config.capture = CaptureConfig {
        output_directory: dir.join("recordings"),
        finalize_grace_ms: 200,
        ..CaptureConfig::default()
    };
    config.library.store_directory = dir.join("store");
    config.feed.latency_ms = 250;
    config
}

#[tokio::test(start_paused = true)]
async fn test_recording_lands_in_library_and_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let controller = CaptureSessionController::new(SyntheticCaptureBackend::new(), config.capture.clone());
    let mut completions = controller.subscribe_completions();
    let mut library = open_library(&config.library).unwrap();
    library.load();

    controller.start().await;
    // Let the ceiling end it.
    let outcome = completions.recv().await.unwrap();
    assert_eq!(outcome.source, OutcomeSource::Captured);
    assert_eq!(outcome.video.duration_secs, 15.0);
    library.append(outcome.video.clone()).unwrap();

    let mut restarted = open_library(&config.library).unwrap();
    let videos = restarted.load();
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].id, outcome.video.id);
    assert!(restarted.total_storage_used() > 0);
}

#[tokio::test(start_paused = true)]
async fn test_simulated_recordings_are_purged_on_restart() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.capture.simulated = true;

    let controller = CaptureSessionController::new(SyntheticCaptureBackend::new(), config.capture.clone());
    let mut library = open_library(&config.library).unwrap();
    library.load();

    controller.start().await;
    tokio::time::sleep(Duration::from_secs(2)).await;
    let outcome = controller.stop().await.unwrap();
    assert_eq!(outcome.source, OutcomeSource::Simulated);
    library.append(outcome.video).unwrap();
    assert_eq!(library.len(), 1);

    let mut restarted = open_library(&config.library).unwrap();
    assert!(restarted.load().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_feed_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let source = MockFeedSource::from_config(&config.feed);
    assert_eq!(source.latency(), Duration::from_millis(250));

    let posts = source.load_feed().await;
    assert!(!posts.is_empty());
    assert_eq!(posts, source.load_feed().await);
}
