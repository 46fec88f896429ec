//! Auto-advance through the status poll
//!
//! These tests let the controller sample the mock device on its own timer
//! (virtual time) instead of injecting status reports.

mod helpers;

use helpers::*;
use lmp_ap::state::PlaybackState;
use lmp_common::LoopMode;

#[tokio::test(start_paused = true)]
async fn test_queue_plays_through_and_restarts() {
    let output = MockOutput::new();
    let controller = spawn_controller(&output).await;

    controller
        .play_track(track("t1"), Some(tracks(&["t1", "t2", "t3"])))
        .await;

    for _ in 0..3 {
        next_poll().await; // playing sample arms the latch
        output.finish_track();
        next_poll().await; // stopped-at-end sample fires
    }

    assert_eq!(
        output.loads(),
        vec![uri("t1"), uri("t2"), uri("t3"), uri("t1")]
    );

    let view = controller.view().await;
    assert_eq!(view.current_index, Some(0));
    assert_eq!(view.state, PlaybackState::Playing);
    assert_eq!(view.loop_mode, LoopMode::None);
}

#[tokio::test(start_paused = true)]
async fn test_loop_one_needs_playing_sample_before_next_fire() {
    let output = MockOutput::new();
    let controller = spawn_controller(&output).await;

    controller.play_track(track("t1"), Some(tracks(&["t1"]))).await;
    controller.set_loop_mode(LoopMode::One).await;

    next_poll().await;
    output.finish_track();
    next_poll().await;
    assert_eq!(output.loads(), vec![uri("t1"), uri("t1")]);

    // Ends again before any poll saw it playing: no refire
    output.finish_track();
    next_poll().await;
    next_poll().await;
    assert_eq!(output.loads().len(), 2);

    // Restarted, seen playing, then finishes: fires once more
    output.set_position(0.0);
    controller.toggle_play_pause().await;
    next_poll().await;
    output.finish_track();
    next_poll().await;
    assert_eq!(output.loads().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_finish_without_playing_sample_does_not_advance() {
    let output = MockOutput::new();
    let controller = spawn_controller(&output).await;

    controller
        .play_track(track("t1"), Some(tracks(&["t1", "t2"])))
        .await;

    // Track ends before the first poll after the load
    output.finish_track();
    next_poll().await;
    next_poll().await;

    assert_eq!(output.loads(), vec![uri("t1")]);
    assert_eq!(controller.view().await.current_index, Some(0));
}

#[tokio::test(start_paused = true)]
async fn test_paused_mid_track_does_not_advance() {
    let output = MockOutput::new();
    let controller = spawn_controller(&output).await;

    controller
        .play_track(track("t1"), Some(tracks(&["t1", "t2"])))
        .await;
    next_poll().await;

    output.set_position(60.0);
    controller.toggle_play_pause().await;
    next_poll().await;
    next_poll().await;

    assert_eq!(output.loads(), vec![uri("t1")]);
    assert_eq!(controller.view().await.state, PlaybackState::Paused);
}

#[tokio::test(start_paused = true)]
async fn test_poll_publishes_position() {
    let output = MockOutput::new();
    let controller = spawn_controller(&output).await;

    controller.play_track(track("t1"), None).await;
    output.set_position(42.0);
    next_poll().await;

    let view = controller.view().await;
    assert_eq!(view.position_seconds, 42.0);
    assert_eq!(view.duration_seconds, MOCK_DURATION_SECONDS);
    assert!(view.is_playing);
}
