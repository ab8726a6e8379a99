use std::fmt;
use std::time::Duration;

use common::{DEFAULT_SAMPLE_INTERVAL, DEFAULT_TICK_RATE};
use serde::{Deserialize, Serialize};

use crate::error::{ReplayError, ReplayResult};

/// Discrete playback speed multipliers offered to the viewer.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackSpeed {
    Quarter,
    Half,
    #[default]
    Normal,
    OneAndHalf,
    Double,
    Quadruple,
}

impl PlaybackSpeed {
    pub const ALL: [PlaybackSpeed; 6] = [
        PlaybackSpeed::Quarter,
        PlaybackSpeed::Half,
        PlaybackSpeed::Normal,
        PlaybackSpeed::OneAndHalf,
        PlaybackSpeed::Double,
        PlaybackSpeed::Quadruple,
    ];

    pub fn multiplier(&self) -> f64 {
        match self {
            PlaybackSpeed::Quarter => 0.25,
            PlaybackSpeed::Half => 0.5,
            PlaybackSpeed::Normal => 1.0,
            PlaybackSpeed::OneAndHalf => 1.5,
            PlaybackSpeed::Double => 2.0,
            PlaybackSpeed::Quadruple => 4.0,
        }
    }

    /// Match a multiplier such as `1.5` to one of the offered speeds.
    pub fn from_multiplier(value: f64) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| (s.multiplier() - value).abs() < f64::EPSILON)
    }

    fn position(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).unwrap_or(2)
    }

    pub fn faster(&self) -> Self {
        let next = (self.position() + 1).min(Self::ALL.len() - 1);
        Self::ALL[next]
    }

    pub fn slower(&self) -> Self {
        Self::ALL[self.position().saturating_sub(1)]
    }
}

impl fmt::Display for PlaybackSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.multiplier())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackConfig {
    /// Source ticks per second.
    pub tick_rate: u32,
    /// Ticks between two stored frames.
    pub sample_interval: u32,
    pub speed: PlaybackSpeed,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            speed: PlaybackSpeed::Normal,
        }
    }
}

impl PlaybackConfig {
    pub fn new(tick_rate: u32, sample_interval: u32, speed: PlaybackSpeed) -> ReplayResult<Self> {
        let config = Self {
            tick_rate,
            sample_interval,
            speed,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ReplayResult<()> {
        if self.tick_rate == 0 {
            return Err(ReplayError::config("tick rate must be greater than zero"));
        }
        if self.sample_interval == 0 {
            return Err(ReplayError::config(
                "sample interval must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Wall-clock duration of one logical frame step at the current speed:
    /// `sample_interval / tick_rate / speed` seconds.
    pub fn frame_duration(&self) -> Duration {
        let secs =
            self.sample_interval as f64 / self.tick_rate as f64 / self.speed.multiplier();
        Duration::from_secs_f64(secs)
    }

    pub fn with_speed(mut self, speed: PlaybackSpeed) -> Self {
        self.speed = speed;
        self
    }
}
