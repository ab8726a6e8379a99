use anyhow::{anyhow, Context, Result};
use clap::Parser;
use common::{DEFAULT_SAMPLE_INTERVAL, DEFAULT_TICK_RATE};
use replay::{PlaybackConfig, PlaybackSpeed, RoundRequest};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "radar-terminal",
    about = "Play back CS2 round replays as a radar in the terminal"
)]
pub struct Args {
    /// Directory searched (recursively) for .ndjson/.json replays, optionally gzipped
    #[arg(long, env = "RADAR_REPLAY_DIR", default_value = "replays")]
    pub replay_dir: PathBuf,

    /// Base URL of the analytics API (e.g. http://localhost:3000)
    #[arg(long, env = "RADAR_API_URL")]
    pub api_url: Option<String>,

    /// Demo to open straight away from the API
    #[arg(long, requires = "api_url")]
    pub demo: Option<String>,

    /// Round of --demo to open
    #[arg(long, default_value_t = 1)]
    pub round: u32,

    /// Fetch the round as one document instead of streaming it
    #[arg(long)]
    pub batch: bool,

    #[arg(long, env = "RADAR_TICK_RATE", default_value_t = DEFAULT_TICK_RATE)]
    pub tick_rate: u32,

    #[arg(long, env = "RADAR_SAMPLE_INTERVAL", default_value_t = DEFAULT_SAMPLE_INTERVAL)]
    pub sample_interval: u32,

    /// Playback speed multiplier: 0.25 | 0.5 | 1 | 1.5 | 2 | 4
    #[arg(long, env = "RADAR_SPEED", default_value_t = 1.0)]
    pub speed: f64,

    /// Log output goes here, the terminal is busy drawing
    #[arg(long, env = "RADAR_LOG_FILE", default_value = "radar-terminal.log")]
    pub log_file: PathBuf,
}

impl Args {
    pub fn playback_config(&self) -> Result<PlaybackConfig> {
        let speed = PlaybackSpeed::from_multiplier(self.speed)
            .ok_or_else(|| anyhow!("Unsupported playback speed {}", self.speed))?;
        let config = PlaybackConfig::new(self.tick_rate, self.sample_interval, speed)
            .context("Invalid playback configuration")?;
        Ok(config)
    }

    /// The round to open at startup, if one was named on the command line.
    pub fn initial_round(&self) -> Option<RoundRequest> {
        self.demo.as_ref().map(|demo| {
            let mut request = RoundRequest::new(demo.clone(), self.round);
            request.sample_interval = self.sample_interval;
            request
        })
    }
}
