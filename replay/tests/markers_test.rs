mod support;

use common::EventCategory;
use replay::markers::{correlate, seek_to_marker};
use replay::{EventCorrelator, EventFilter, ReplayTimeline};
use support::{bomb_plant, frames_between, kill, metadata};

fn loaded() -> ReplayTimeline {
    let mut timeline = ReplayTimeline::new();
    timeline.load_replay("r");
    timeline.set_metadata(metadata(1000, 5000));
    timeline.set_frames(frames_between(1000, 5000, 8));
    timeline.set_events(vec![kill(2000), bomb_plant(3000), kill(4000)]);
    timeline
}

#[test]
fn test_markers_are_placed_across_round() {
    let timeline = loaded();
    let markers = correlate(timeline.events(), EventFilter::default(), (1000, 5000));
    let positions: Vec<f64> = markers.iter().map(|m| m.position).collect();
    assert_eq!(positions, vec![0.25, 0.5, 0.75]);
    assert_eq!(markers[1].category, EventCategory::Bomb);
    assert_eq!(markers[1].event_index, 1);
}

#[test]
fn test_cache_rebuilds_only_on_change() {
    let mut timeline = loaded();
    let mut correlator = EventCorrelator::new();
    let filter = EventFilter::default();

    assert_eq!(correlator.markers(&timeline, filter).len(), 3);
    assert_eq!(correlator.markers(&timeline, filter).len(), 3);
    timeline.seek(100);
    timeline.play();
    correlator.markers(&timeline, filter);
    assert_eq!(correlator.rebuilds(), 1);

    let kills_only = EventFilter {
        bomb: false,
        ..Default::default()
    };
    assert_eq!(correlator.markers(&timeline, kills_only).len(), 2);
    assert_eq!(correlator.rebuilds(), 2);

    let mut events = timeline.events().to_vec();
    events.push(kill(4500));
    timeline.set_events(events);
    assert_eq!(correlator.markers(&timeline, kills_only).len(), 3);
    assert_eq!(correlator.rebuilds(), 3);

    timeline.set_metadata(metadata(1000, 9000));
    let markers = correlator.markers(&timeline, kills_only);
    assert_eq!(markers[0].position, 0.125);
    assert_eq!(correlator.rebuilds(), 4);
}

#[test]
fn test_range_falls_back_to_frames() {
    let mut timeline = ReplayTimeline::new();
    timeline.set_frames(frames_between(0, 800, 8));
    timeline.set_events(vec![kill(200)]);
    let mut correlator = EventCorrelator::new();
    let markers = correlator.markers(&timeline, EventFilter::default());
    assert_eq!(markers[0].position, 0.25);
}

#[test]
fn test_no_round_no_markers() {
    let timeline = ReplayTimeline::new();
    let mut correlator = EventCorrelator::new();
    assert!(correlator.markers(&timeline, EventFilter::default()).is_empty());
}

#[test]
fn test_neighbouring_markers() {
    let timeline = loaded();
    let mut correlator = EventCorrelator::new();
    correlator.markers(&timeline, EventFilter::default());

    assert_eq!(correlator.next_marker_after(2000).map(|m| m.tick), Some(3000));
    assert_eq!(correlator.previous_marker_before(2000).map(|m| m.tick), None);
    assert_eq!(correlator.previous_marker_before(9999).map(|m| m.tick), Some(4000));
}

#[test]
fn test_seek_to_marker_moves_timeline() {
    let mut timeline = loaded();
    let mut correlator = EventCorrelator::new();
    let marker = correlator.markers(&timeline, EventFilter::default())[1].clone();
    seek_to_marker(&mut timeline, &marker);
    assert_eq!(timeline.current_tick(), 3000);
    assert_eq!(timeline.current_index(), 250);
}
