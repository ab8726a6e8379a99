use common::{EventCategory, ReplayEvent};

use crate::timeline::{EventFilter, ReplayTimeline};

/// One event placed on the round timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineMarker {
    /// Index into the timeline's event array.
    pub event_index: usize,
    pub tick: u32,
    /// Normalized position in `[0, 1]` across the round's tick range.
    pub position: f64,
    pub category: EventCategory,
    pub label: String,
}

pub fn normalized_position(tick: u32, start_tick: u32, end_tick: u32) -> f64 {
    if end_tick <= start_tick {
        return 0.0;
    }
    let offset = tick.clamp(start_tick, end_tick) - start_tick;
    offset as f64 / (end_tick - start_tick) as f64
}

impl EventFilter {
    pub fn includes(&self, category: EventCategory) -> bool {
        match category {
            EventCategory::Kill => self.kills,
            EventCategory::Bomb => self.bomb,
            EventCategory::Grenade => self.grenades,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CacheKey {
    revision: u64,
    filter: EventFilter,
    range: (u32, u32),
}

/// Maps events onto timeline positions. The marker list is only rebuilt when
/// the event array, the filter or the tick range changes.
#[derive(Debug, Default)]
pub struct EventCorrelator {
    key: Option<CacheKey>,
    markers: Vec<TimelineMarker>,
    rebuilds: usize,
}

impl EventCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn markers(&mut self, timeline: &ReplayTimeline, filter: EventFilter) -> &[TimelineMarker] {
        let Some(range) = timeline.tick_range() else {
            self.key = None;
            self.markers.clear();
            return &self.markers;
        };

        let key = CacheKey {
            revision: timeline.events_revision(),
            filter,
            range,
        };
        if self.key != Some(key) {
            self.markers = correlate(timeline.events(), filter, range);
            self.key = Some(key);
            self.rebuilds += 1;
        }
        &self.markers
    }

    /// How many times the marker list has been recomputed.
    pub fn rebuilds(&self) -> usize {
        self.rebuilds
    }

    /// First marker strictly after `tick`, from the last computed list.
    pub fn next_marker_after(&self, tick: u32) -> Option<&TimelineMarker> {
        self.markers.iter().find(|m| m.tick > tick)
    }

    /// Last marker strictly before `tick`, from the last computed list.
    pub fn previous_marker_before(&self, tick: u32) -> Option<&TimelineMarker> {
        self.markers.iter().rev().find(|m| m.tick < tick)
    }
}

pub fn correlate(events: &[ReplayEvent], filter: EventFilter, range: (u32, u32)) -> Vec<TimelineMarker> {
    let (start, end) = range;
    events
        .iter()
        .enumerate()
        .filter(|(_, e)| filter.includes(e.category()))
        .map(|(event_index, e)| TimelineMarker {
            event_index,
            tick: e.tick(),
            position: normalized_position(e.tick(), start, end),
            category: e.category(),
            label: e.label(),
        })
        .collect()
}

/// Jump the timeline to a marker's tick.
pub fn seek_to_marker(timeline: &mut ReplayTimeline, marker: &TimelineMarker) {
    timeline.seek_to_tick(marker.tick);
}
