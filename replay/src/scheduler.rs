//! Turns irregular render-clock callbacks into an exact number of timeline
//! advances.
//!
//! The host calls [`PlaybackScheduler::on_callback`] once per render pass with
//! the current time. Elapsed time is accumulated and one `next_frame` is
//! issued per whole frame duration, so late callbacks catch up instead of
//! dropping time. Cancellation is cooperative: every `start`/`cancel` bumps
//! an epoch, and callbacks carrying an older [`LoopToken`] do nothing.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::PlaybackConfig;
use crate::timeline::{PlaybackState, ReplayTimeline};

/// Identifies one started loop. Stale tokens are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The token belongs to a cancelled or replaced loop.
    Stale,
    /// The timeline is no longer playing; the loop has shut itself down.
    Stopped,
    /// First callback after a start: only the reference time was recorded.
    Primed,
    /// Number of frames stepped during this callback (may be zero).
    Advanced(usize),
}

pub struct PlaybackScheduler {
    frame_duration: Duration,
    epoch: u64,
    running: bool,
    last_callback: Option<Instant>,
    accumulator: Duration,
}

impl PlaybackScheduler {
    pub fn new(config: &PlaybackConfig) -> Self {
        Self {
            frame_duration: config.frame_duration(),
            epoch: 0,
            running: false,
            last_callback: None,
            accumulator: Duration::ZERO,
        }
    }

    /// Apply a new speed or rate. Takes effect on the next callback.
    pub fn set_frame_duration(&mut self, frame_duration: Duration) {
        self.frame_duration = frame_duration;
    }

    pub fn frame_duration(&self) -> Duration {
        self.frame_duration
    }

    /// Start a fresh loop, cancelling any loop that was running.
    pub fn start(&mut self) -> LoopToken {
        self.epoch += 1;
        self.running = true;
        self.last_callback = None;
        self.accumulator = Duration::ZERO;
        debug!("Playback loop {} started", self.epoch);
        LoopToken(self.epoch)
    }

    pub fn cancel(&mut self) {
        if self.running {
            debug!("Playback loop {} cancelled", self.epoch);
        }
        self.epoch += 1;
        self.running = false;
        self.last_callback = None;
        self.accumulator = Duration::ZERO;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn on_callback(
        &mut self,
        token: LoopToken,
        now: Instant,
        timeline: &mut ReplayTimeline,
    ) -> CallbackOutcome {
        if !self.running || token.0 != self.epoch {
            return CallbackOutcome::Stale;
        }

        // Someone else may have paused or reset the timeline since the last callback.
        if timeline.state() != PlaybackState::Playing {
            self.running = false;
            self.last_callback = None;
            self.accumulator = Duration::ZERO;
            return CallbackOutcome::Stopped;
        }

        let Some(last) = self.last_callback.replace(now) else {
            return CallbackOutcome::Primed;
        };
        self.accumulator += now.saturating_duration_since(last);

        let mut advanced = 0;
        while self.accumulator >= self.frame_duration {
            self.accumulator -= self.frame_duration;
            timeline.next_frame();
            if timeline.state() != PlaybackState::Playing {
                // Ended: the step that hit the end does not count as a move.
                self.running = false;
                self.accumulator = Duration::ZERO;
                return if advanced == 0 {
                    CallbackOutcome::Stopped
                } else {
                    CallbackOutcome::Advanced(advanced)
                };
            }
            advanced += 1;
        }
        CallbackOutcome::Advanced(advanced)
    }
}
