use serde::{Deserialize, Serialize};

use crate::event::ReplayEvent;
use crate::frame::{Team, TickFrame};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub steam_id: String,
    pub name: String,
    #[serde(default)]
    pub team: Team,
}

/// Per-round metadata. `[start_tick, end_tick]` is the valid tick range of the round.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RoundMetadata {
    #[serde(default)]
    pub round_number: u32,
    pub start_tick: u32,
    pub end_tick: u32,
    #[serde(default)]
    pub freeze_end_tick: Option<u32>,
    #[serde(default)]
    pub winner: Option<Team>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub ct_score: u32,
    #[serde(default)]
    pub t_score: u32,
    #[serde(default)]
    pub map_name: Option<String>,
    #[serde(default)]
    pub tick_rate: Option<u32>,
    #[serde(default)]
    pub roster: Vec<RosterEntry>,
}

impl RoundMetadata {
    pub fn tick_span(&self) -> u32 {
        self.end_tick.saturating_sub(self.start_tick)
    }

    pub fn player_name(&self, steam_id: &str) -> Option<&str> {
        self.roster
            .iter()
            .find(|p| p.steam_id == steam_id)
            .map(|p| p.name.as_str())
    }
}

/// Non-streaming replay document: metadata fields plus the full frame and event arrays.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct BatchReplay {
    #[serde(flatten)]
    pub metadata: RoundMetadata,
    #[serde(default)]
    pub frames: Vec<TickFrame>,
    #[serde(default)]
    pub events: Vec<ReplayEvent>,
}
