mod support;

use std::time::{Duration, Instant};

use replay::{
    CallbackOutcome, PlaybackConfig, PlaybackScheduler, PlaybackSpeed, PlaybackState,
    ReplayTimeline,
};
use support::frames_between;

fn playing(frame_count: u32) -> ReplayTimeline {
    let mut timeline = ReplayTimeline::new();
    timeline.set_frames(frames_between(0, (frame_count - 1) * 8, 8));
    timeline.play();
    timeline
}

/// Drive the scheduler with evenly spaced callbacks and return the final index.
fn run_for(
    scheduler: &mut PlaybackScheduler,
    timeline: &mut ReplayTimeline,
    total: Duration,
    step: Duration,
) -> usize {
    let token = scheduler.start();
    let t0 = Instant::now();
    scheduler.on_callback(token, t0, timeline);
    let mut elapsed = Duration::ZERO;
    while elapsed < total {
        elapsed = (elapsed + step).min(total);
        scheduler.on_callback(token, t0 + elapsed, timeline);
    }
    timeline.current_index()
}

#[test]
fn test_one_frame_per_125ms_at_normal_speed() {
    let config = PlaybackConfig::new(64, 8, PlaybackSpeed::Normal).unwrap();
    let mut scheduler = PlaybackScheduler::new(&config);
    let mut timeline = playing(100);

    let index = run_for(
        &mut scheduler,
        &mut timeline,
        Duration::from_millis(1000),
        Duration::from_millis(16),
    );
    assert_eq!(index, 8);
}

#[test]
fn test_double_speed_halves_frame_time() {
    let config = PlaybackConfig::new(64, 8, PlaybackSpeed::Double).unwrap();
    let mut scheduler = PlaybackScheduler::new(&config);
    assert_eq!(scheduler.frame_duration(), Duration::from_micros(62_500));
    let mut timeline = playing(100);

    let index = run_for(
        &mut scheduler,
        &mut timeline,
        Duration::from_millis(1000),
        Duration::from_millis(16),
    );
    assert_eq!(index, 16);
}

#[test]
fn test_jittery_callbacks_do_not_lose_time() {
    let config = PlaybackConfig::default();
    let mut scheduler = PlaybackScheduler::new(&config);
    let mut timeline = playing(100);
    let token = scheduler.start();

    let t0 = Instant::now();
    assert_eq!(scheduler.on_callback(token, t0, &mut timeline), CallbackOutcome::Primed);

    // Irregular gaps summing to exactly one second
    let gaps = [5u64, 40, 3, 200, 17, 90, 300, 45, 100, 200];
    assert_eq!(gaps.iter().sum::<u64>(), 1000);
    let mut now = t0;
    for gap in gaps {
        now += Duration::from_millis(gap);
        scheduler.on_callback(token, now, &mut timeline);
    }
    assert_eq!(timeline.current_index(), 8);
}

#[test]
fn test_late_callback_catches_up() {
    let mut scheduler = PlaybackScheduler::new(&PlaybackConfig::default());
    let mut timeline = playing(100);
    let token = scheduler.start();
    let t0 = Instant::now();
    scheduler.on_callback(token, t0, &mut timeline);

    let outcome = scheduler.on_callback(token, t0 + Duration::from_millis(500), &mut timeline);
    assert_eq!(outcome, CallbackOutcome::Advanced(4));
    assert_eq!(timeline.current_index(), 4);
}

#[test]
fn test_loop_stops_when_paused_externally() {
    let mut scheduler = PlaybackScheduler::new(&PlaybackConfig::default());
    let mut timeline = playing(100);
    let token = scheduler.start();
    let t0 = Instant::now();
    scheduler.on_callback(token, t0, &mut timeline);
    scheduler.on_callback(token, t0 + Duration::from_millis(130), &mut timeline);
    assert_eq!(timeline.current_index(), 1);

    timeline.pause();
    let outcome = scheduler.on_callback(token, t0 + Duration::from_secs(5), &mut timeline);
    assert_eq!(outcome, CallbackOutcome::Stopped);
    assert!(!scheduler.is_running());
    assert_eq!(timeline.current_index(), 1);
}

#[test]
fn test_reaching_the_end_stops_advancing() {
    let mut scheduler = PlaybackScheduler::new(&PlaybackConfig::default());
    let mut timeline = playing(3);
    let token = scheduler.start();
    let t0 = Instant::now();
    scheduler.on_callback(token, t0, &mut timeline);

    let outcome = scheduler.on_callback(token, t0 + Duration::from_secs(10), &mut timeline);
    assert_eq!(outcome, CallbackOutcome::Advanced(2));
    assert_eq!(timeline.state(), PlaybackState::Ended);
    assert_eq!(timeline.current_index(), 2);
    assert!(!scheduler.is_running());

    let outcome = scheduler.on_callback(token, t0 + Duration::from_secs(20), &mut timeline);
    assert_eq!(outcome, CallbackOutcome::Stale);
    assert_eq!(timeline.current_index(), 2);
}

#[test]
fn test_speed_change_applies_without_restart() {
    let mut scheduler = PlaybackScheduler::new(&PlaybackConfig::default());
    let mut timeline = playing(100);
    let token = scheduler.start();
    let t0 = Instant::now();
    scheduler.on_callback(token, t0, &mut timeline);
    scheduler.on_callback(token, t0 + Duration::from_millis(250), &mut timeline);
    assert_eq!(timeline.current_index(), 2);

    let faster = PlaybackConfig::default().with_speed(PlaybackSpeed::Quadruple);
    scheduler.set_frame_duration(faster.frame_duration());
    scheduler.on_callback(token, t0 + Duration::from_millis(375), &mut timeline);
    assert_eq!(timeline.current_index(), 6);
}
