//! Sub-frame smoothing between the two frames that bracket the play position.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use common::{PlayerState, TickFrame};

use crate::config::PlaybackConfig;
use crate::timeline::{PlaybackState, ReplayTimeline};

pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// Wrap an angle in degrees into `[0, 360)`.
pub fn normalize_angle(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Interpolate a yaw along the shortest arc, so 350 -> 10 passes through 0.
pub fn interpolate_angle(from: f32, to: f32, t: f32) -> f32 {
    let from = normalize_angle(from);
    let to = normalize_angle(to);
    let delta = (to - from + 180.0).rem_euclid(360.0) - 180.0;
    normalize_angle(from + delta * t)
}

/// Pose of `current` blended towards from `previous` by `t`.
pub fn interpolate_player(previous: &PlayerState, current: &PlayerState, t: f32) -> PlayerState {
    let mut pose = current.clone();
    pose.x = lerp(previous.x, current.x, t);
    pose.y = lerp(previous.y, current.y, t);
    pose.z = lerp(previous.z, current.z, t);
    pose.yaw = interpolate_angle(previous.yaw, current.yaw, t);
    pose.pitch = lerp(previous.pitch, current.pitch, t);
    pose
}

/// Blend every player of `current` with its counterpart (by steam id) in
/// `previous`. Players that only exist in `current` pass through unchanged.
pub fn interpolate_frame(previous: &TickFrame, current: &TickFrame, t: f32) -> Vec<PlayerState> {
    let by_id: HashMap<&str, &PlayerState> = previous
        .players
        .iter()
        .map(|p| (p.steam_id.as_str(), p))
        .collect();

    current
        .players
        .iter()
        .map(|player| match by_id.get(player.steam_id.as_str()) {
            Some(prev) => interpolate_player(prev, player, t),
            None => player.clone(),
        })
        .collect()
}

pub struct FrameInterpolator {
    frame_duration: Duration,
    previous_index: Option<usize>,
    current_index: Option<usize>,
    factor: f32,
    last_callback: Option<Instant>,
}

impl FrameInterpolator {
    pub fn new(config: &PlaybackConfig) -> Self {
        Self {
            frame_duration: config.frame_duration(),
            previous_index: None,
            current_index: None,
            factor: 1.0,
            last_callback: None,
        }
    }

    pub fn set_frame_duration(&mut self, frame_duration: Duration) {
        self.frame_duration = frame_duration;
    }

    /// Interpolation factor in `[0, 1]` between the previous and current frame.
    pub fn factor(&self) -> f32 {
        self.factor
    }

    pub fn reset(&mut self) {
        self.previous_index = None;
        self.current_index = None;
        self.factor = 1.0;
        self.last_callback = None;
    }

    /// Per-render-pass update. Tracks frame changes on the timeline and grows
    /// the factor from 0 to 1 over one frame duration.
    pub fn on_callback(&mut self, now: Instant, timeline: &ReplayTimeline) {
        if timeline.frames().is_empty() {
            self.reset();
            return;
        }

        let index = timeline.current_index();
        if self.current_index != Some(index) {
            self.previous_index = match self.current_index {
                // Moving forward: blend from the frame just before the new one.
                Some(old) if index > old => Some(index - 1),
                // Backwards or first observation: snap.
                _ => None,
            };
            self.current_index = Some(index);
            self.factor = if self.previous_index.is_some() { 0.0 } else { 1.0 };
            if self.previous_index.is_some() && timeline.state() == PlaybackState::Playing {
                // The blend towards the new frame starts now.
                self.last_callback = Some(now);
                return;
            }
        }

        if timeline.state() != PlaybackState::Playing {
            // Paused or stepping: show the stored frame exactly.
            self.factor = 1.0;
            self.last_callback = None;
            return;
        }

        let Some(last) = self.last_callback.replace(now) else {
            return;
        };
        if self.frame_duration.is_zero() {
            self.factor = 1.0;
            return;
        }
        let step = now.saturating_duration_since(last).as_secs_f32()
            / self.frame_duration.as_secs_f32();
        self.factor = (self.factor + step).min(1.0);
    }

    /// Interpolated poses for the current render pass.
    pub fn poses(&self, timeline: &ReplayTimeline) -> Vec<PlayerState> {
        let Some(current) = self.current_index.and_then(|i| timeline.frame(i)) else {
            return timeline
                .current_frame()
                .map(|f| f.players.clone())
                .unwrap_or_default();
        };

        match self.previous_index.and_then(|i| timeline.frame(i)) {
            Some(previous) if self.factor < 1.0 => interpolate_frame(previous, current, self.factor),
            _ => current.players.clone(),
        }
    }
}
