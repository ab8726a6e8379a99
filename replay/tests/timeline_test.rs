mod support;

use support::{frames_between, metadata};
use replay::{DisplayPreferences, EventFilter, PlaybackState, ReplayTimeline, ViewLayout};

fn loaded(start: u32, end: u32) -> ReplayTimeline {
    let mut timeline = ReplayTimeline::new();
    timeline.load_replay("demo/round-1");
    timeline.set_metadata(metadata(start, end));
    timeline.set_frames(frames_between(start, end, 8));
    timeline
}

#[test]
fn test_round_scenario_seek_to_tick() {
    let mut timeline = loaded(1000, 5000);
    assert_eq!(timeline.state(), PlaybackState::Ready);
    assert_eq!(timeline.frames().first().map(|f| f.tick), Some(1000));
    assert_eq!(timeline.frames().last().map(|f| f.tick), Some(5000));

    timeline.seek_to_tick(1012);
    assert_eq!(timeline.current_index(), 1);
    assert_eq!(timeline.current_tick(), 1008);
}

#[test]
fn test_seek_to_tick_finds_greatest_tick_at_or_before() {
    let mut timeline = loaded(0, 800);

    for target in [0u32, 7, 8, 9, 399, 400, 799, 800, 5000] {
        timeline.seek_to_tick(target);
        let expected = timeline
            .frames()
            .iter()
            .rposition(|f| f.tick <= target)
            .unwrap();
        assert_eq!(timeline.current_index(), expected, "target {}", target);
        assert_eq!(timeline.current_tick(), timeline.frames()[expected].tick);
    }
}

#[test]
fn test_seek_to_tick_before_first_frame_goes_to_start() {
    let mut timeline = loaded(1000, 2000);
    timeline.seek(10);
    timeline.seek_to_tick(3);
    assert_eq!(timeline.current_index(), 0);
    assert_eq!(timeline.current_tick(), 1000);
}

#[test]
fn test_seek_clamps_out_of_range_indices() {
    let mut timeline = loaded(0, 80);
    let last = timeline.frames().len() - 1;

    timeline.seek(1_000);
    assert_eq!(timeline.current_index(), last);
    assert_eq!(timeline.current_tick(), 80);

    timeline.skip(-500);
    assert_eq!(timeline.current_index(), 0);

    timeline.skip(3);
    assert_eq!(timeline.current_index(), 3);
    assert_eq!(timeline.current_tick(), 24);
}

#[test]
fn test_play_at_last_frame_restarts() {
    let mut timeline = loaded(0, 80);
    let last = timeline.frames().len() - 1;
    timeline.seek(last);

    timeline.play();
    assert_eq!(timeline.state(), PlaybackState::Playing);
    assert_eq!(timeline.current_index(), 0);
    assert_eq!(timeline.current_tick(), 0);
}

#[test]
fn test_advancing_past_end_ends_playback() {
    let mut timeline = loaded(0, 16);
    timeline.play();
    timeline.next_frame();
    timeline.next_frame();
    assert_eq!(timeline.state(), PlaybackState::Playing);
    assert_eq!(timeline.current_index(), 2);

    timeline.next_frame();
    assert_eq!(timeline.state(), PlaybackState::Ended);
    assert_eq!(timeline.current_index(), 2);

    // Further steps change nothing until playback is restarted
    timeline.next_frame();
    timeline.next_frame();
    assert_eq!(timeline.state(), PlaybackState::Ended);
    assert_eq!(timeline.current_index(), 2);

    timeline.play();
    assert_eq!(timeline.state(), PlaybackState::Playing);
    assert_eq!(timeline.current_index(), 0);
}

#[test]
fn test_toggle_play_and_pause() {
    let mut timeline = loaded(0, 80);
    timeline.toggle_play();
    assert_eq!(timeline.state(), PlaybackState::Playing);
    timeline.toggle_play();
    assert_eq!(timeline.state(), PlaybackState::Paused);
    timeline.pause();
    assert_eq!(timeline.state(), PlaybackState::Paused);
    timeline.toggle_play();
    assert_eq!(timeline.state(), PlaybackState::Playing);
}

#[test]
fn test_reset_preserves_display_preferences() {
    let mut timeline = loaded(0, 80);
    let preferences = DisplayPreferences {
        layout: ViewLayout::RadarOnly,
        events: EventFilter {
            kills: true,
            bomb: false,
            grenades: false,
        },
    };
    timeline.set_preferences(preferences);
    timeline.seek(4);

    timeline.reset();
    assert_eq!(timeline.state(), PlaybackState::Idle);
    assert!(timeline.frames().is_empty());
    assert!(timeline.events().is_empty());
    assert!(timeline.metadata().is_none());
    assert_eq!(timeline.current_index(), 0);
    assert_eq!(timeline.current_tick(), 0);
    assert_eq!(timeline.preferences(), preferences);

    // Loading another round keeps them as well
    timeline.load_replay("demo/round-2");
    assert_eq!(timeline.state(), PlaybackState::Loading);
    assert_eq!(timeline.preferences(), preferences);
}

#[test]
fn test_load_replay_clears_previous_round() {
    let mut timeline = loaded(0, 80);
    timeline.set_events(vec![support::kill(40)]);
    timeline.seek(5);

    timeline.load_replay("demo/round-2");
    assert_eq!(timeline.replay_id(), Some("demo/round-2"));
    assert!(timeline.frames().is_empty());
    assert!(timeline.events().is_empty());
    assert_eq!(timeline.current_index(), 0);
}

#[test]
fn test_set_events_sorts_by_tick() {
    let mut timeline = loaded(0, 800);
    let before = timeline.events_revision();
    timeline.set_events(vec![support::kill(600), support::bomb_plant(200), support::kill(400)]);
    let ticks: Vec<u32> = timeline.events().iter().map(|e| e.tick()).collect();
    assert_eq!(ticks, vec![200, 400, 600]);
    assert!(timeline.events_revision() > before);
}

#[test]
fn test_unsorted_frames_are_normalized() {
    let mut timeline = ReplayTimeline::new();
    let mut frames = frames_between(0, 64, 8);
    frames.reverse();
    frames.push(frames[0].clone());
    timeline.set_frames(frames);

    let ticks: Vec<u32> = timeline.frames().iter().map(|f| f.tick).collect();
    assert_eq!(ticks, vec![0, 8, 16, 24, 32, 40, 48, 56, 64]);
}
