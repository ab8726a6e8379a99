//! The replay timeline: sole owner of the frame and event arrays and of the
//! play position. Everything that changes it goes through a named operation,
//! and every operation publishes a fresh [`PlaybackStatus`] to subscribers.

use common::{ReplayEvent, RoundMetadata, TickFrame, normalize_frames};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackState {
    #[default]
    Idle,
    Loading,
    Ready,
    Playing,
    Paused,
    Ended,
}

/// Snapshot published on every timeline change.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaybackStatus {
    pub state: PlaybackState,
    pub current_index: usize,
    pub current_tick: u32,
    pub total_frames: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ViewLayout {
    #[default]
    RadarWithRoster,
    RadarOnly,
}

/// Which event categories the viewer wants on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventFilter {
    pub kills: bool,
    pub bomb: bool,
    pub grenades: bool,
}

impl Default for EventFilter {
    fn default() -> Self {
        Self {
            kills: true,
            bomb: true,
            grenades: true,
        }
    }
}

/// User display choices. These survive round switches and resets.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DisplayPreferences {
    pub layout: ViewLayout,
    pub events: EventFilter,
}

pub struct ReplayTimeline {
    replay_id: Option<String>,
    metadata: Option<RoundMetadata>,
    frames: Vec<TickFrame>,
    events: Vec<ReplayEvent>,
    events_revision: u64,
    current_index: usize,
    current_tick: u32,
    state: PlaybackState,
    error: Option<String>,
    preferences: DisplayPreferences,
    status_tx: watch::Sender<PlaybackStatus>,
}

impl Default for ReplayTimeline {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplayTimeline {
    pub fn new() -> Self {
        let (status_tx, _) = watch::channel(PlaybackStatus::default());
        Self {
            replay_id: None,
            metadata: None,
            frames: Vec::new(),
            events: Vec::new(),
            events_revision: 0,
            current_index: 0,
            current_tick: 0,
            state: PlaybackState::Idle,
            error: None,
            preferences: DisplayPreferences::default(),
            status_tx,
        }
    }

    /// Receive a new status after every change.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackStatus> {
        self.status_tx.subscribe()
    }

    // --- Loading ---

    /// Start loading a round: clears frames, events and position.
    pub fn load_replay(&mut self, replay_id: impl Into<String>) {
        let replay_id = replay_id.into();
        info!("Loading replay {}", replay_id);
        self.clear_round();
        self.replay_id = Some(replay_id);
        self.state = PlaybackState::Loading;
        self.notify();
    }

    /// Back to an empty idle timeline. Display preferences are kept.
    pub fn reset(&mut self) {
        self.clear_round();
        self.replay_id = None;
        self.state = PlaybackState::Idle;
        self.notify();
    }

    pub fn set_metadata(&mut self, metadata: RoundMetadata) {
        self.metadata = Some(metadata);
        self.notify();
    }

    /// Install the frame array. During active playback the array is swapped
    /// without touching the playback state; streamed data goes through
    /// [`ReplayTimeline::append_frames`] instead.
    pub fn set_frames(&mut self, mut frames: Vec<TickFrame>) {
        normalize_frames(&mut frames);
        self.frames = frames;
        self.after_frames_changed();
    }

    /// Merge streamed frames onto the end of the array. Frames that would
    /// break strict tick ordering are dropped.
    pub fn append_frames(&mut self, batch: impl IntoIterator<Item = TickFrame>) {
        let mut dropped = 0;
        for frame in batch {
            match self.frames.last() {
                Some(last) if frame.tick <= last.tick => dropped += 1,
                _ => self.frames.push(frame),
            }
        }
        if dropped > 0 {
            warn!("Dropped {} streamed frames with non-increasing ticks", dropped);
        }
        self.after_frames_changed();
    }

    /// The source delivered everything it had. A round that never produced a
    /// frame drops back to idle.
    pub fn finish_loading(&mut self) {
        if self.state == PlaybackState::Loading {
            info!("Round {:?} finished loading without frames", self.replay_id);
            self.state = PlaybackState::Idle;
            self.notify();
        }
    }

    pub fn set_events(&mut self, mut events: Vec<ReplayEvent>) {
        events.sort_by_key(|e| e.tick());
        self.events = events;
        self.events_revision += 1;
        self.notify();
    }

    /// Errors are a hard reset: the round is dropped and the state forced to idle.
    pub fn set_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("Replay error: {}", message);
        self.clear_round();
        self.state = PlaybackState::Idle;
        self.error = Some(message);
        self.notify();
    }

    // --- Position ---

    /// Jump to a frame index, clamped into range.
    pub fn seek(&mut self, index: usize) {
        if self.frames.is_empty() {
            debug!("Ignoring seek with no frames loaded");
            return;
        }
        self.current_index = index.min(self.frames.len() - 1);
        self.current_tick = self.frames[self.current_index].tick;
        if self.state == PlaybackState::Ended && !self.at_last_frame() {
            self.state = PlaybackState::Paused;
        }
        self.notify();
    }

    /// Move relative to the current frame, clamped into range.
    pub fn skip(&mut self, delta: isize) {
        let target = self.current_index.saturating_add_signed(delta);
        self.seek(target);
    }

    /// Seek to the last frame whose tick is at or before `tick`, or to the
    /// first frame when `tick` precedes all of them.
    pub fn seek_to_tick(&mut self, tick: u32) {
        self.seek(self.index_for_tick(tick));
    }

    /// Step one frame forward. Stepping past the last frame ends playback.
    pub fn next_frame(&mut self) {
        if self.frames.is_empty() || self.state == PlaybackState::Loading {
            return;
        }
        if self.at_last_frame() {
            if self.state != PlaybackState::Ended {
                debug!("Reached end of replay at tick {}", self.current_tick);
                self.state = PlaybackState::Ended;
                self.notify();
            }
            return;
        }
        self.current_index += 1;
        self.current_tick = self.frames[self.current_index].tick;
        self.notify();
    }

    pub fn previous_frame(&mut self) {
        if self.frames.is_empty() || self.current_index == 0 {
            return;
        }
        self.seek(self.current_index - 1);
    }

    // --- Playback state ---

    /// Start playing. Restarts from the first frame when sitting on the last one.
    pub fn play(&mut self) {
        if self.state == PlaybackState::Loading || self.frames.is_empty() {
            debug!("Ignoring play in state {:?} with {} frames", self.state, self.frames.len());
            return;
        }
        if self.at_last_frame() {
            self.current_index = 0;
            self.current_tick = self.frames[0].tick;
        }
        self.state = PlaybackState::Playing;
        self.notify();
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
            self.notify();
        }
    }

    pub fn toggle_play(&mut self) {
        if self.state == PlaybackState::Playing {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn set_preferences(&mut self, preferences: DisplayPreferences) {
        self.preferences = preferences;
    }

    // --- Reads ---

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn replay_id(&self) -> Option<&str> {
        self.replay_id.as_deref()
    }

    pub fn metadata(&self) -> Option<&RoundMetadata> {
        self.metadata.as_ref()
    }

    pub fn frames(&self) -> &[TickFrame] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> Option<&TickFrame> {
        self.frames.get(index)
    }

    pub fn current_frame(&self) -> Option<&TickFrame> {
        self.frames.get(self.current_index)
    }

    pub fn events(&self) -> &[ReplayEvent] {
        &self.events
    }

    /// Bumped every time the event array is replaced.
    pub fn events_revision(&self) -> u64 {
        self.events_revision
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_tick(&self) -> u32 {
        self.current_tick
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn preferences(&self) -> DisplayPreferences {
        self.preferences
    }

    /// Tick range of the round: metadata when present, else the loaded frames.
    pub fn tick_range(&self) -> Option<(u32, u32)> {
        if let Some(meta) = &self.metadata {
            return Some((meta.start_tick, meta.end_tick));
        }
        match (self.frames.first(), self.frames.last()) {
            (Some(first), Some(last)) => Some((first.tick, last.tick)),
            _ => None,
        }
    }

    pub fn progress(&self) -> Progress {
        let total = self.frames.len();
        let percentage = if total > 1 {
            self.current_index as f64 / (total - 1) as f64 * 100.0
        } else {
            0.0
        };
        Progress {
            current: self.current_index,
            total,
            percentage,
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        PlaybackStatus {
            state: self.state,
            current_index: self.current_index,
            current_tick: self.current_tick,
            total_frames: self.frames.len(),
            error: self.error.clone(),
        }
    }

    /// Index `seek_to_tick` would land on.
    pub fn index_for_tick(&self, tick: u32) -> usize {
        self.frames
            .partition_point(|f| f.tick <= tick)
            .saturating_sub(1)
    }

    fn at_last_frame(&self) -> bool {
        self.current_index + 1 >= self.frames.len()
    }

    fn clear_round(&mut self) {
        self.metadata = None;
        self.frames.clear();
        self.events.clear();
        self.events_revision += 1;
        self.current_index = 0;
        self.current_tick = 0;
        self.error = None;
    }

    fn after_frames_changed(&mut self) {
        if self.frames.is_empty() {
            self.current_index = 0;
            self.current_tick = 0;
        } else {
            self.current_index = self.current_index.min(self.frames.len() - 1);
            self.current_tick = self.frames[self.current_index].tick;
        }

        match self.state {
            PlaybackState::Idle | PlaybackState::Loading | PlaybackState::Ready => {
                self.state = if self.frames.is_empty() {
                    PlaybackState::Idle
                } else {
                    PlaybackState::Ready
                };
            }
            // Frames keep streaming in while the user is watching.
            PlaybackState::Playing | PlaybackState::Paused | PlaybackState::Ended => {}
        }
        self.notify();
    }

    fn notify(&self) {
        self.status_tx.send_replace(self.status());
    }
}
