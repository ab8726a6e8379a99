use serde::{Deserialize, Serialize};

use crate::constants::{TEAM_CT, TEAM_SPECTATOR, TEAM_T};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Vec3 { x, y, z }
    }
}

/// Team as carried by the demo's `team_num` property.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(from = "u8", into = "u8")]
pub enum Team {
    #[default]
    Unassigned,
    Spectator,
    Terrorist,
    CounterTerrorist,
}

impl From<u8> for Team {
    fn from(value: u8) -> Self {
        match value {
            TEAM_SPECTATOR => Team::Spectator,
            TEAM_T => Team::Terrorist,
            TEAM_CT => Team::CounterTerrorist,
            _ => Team::Unassigned,
        }
    }
}

impl From<Team> for u8 {
    fn from(team: Team) -> Self {
        match team {
            Team::Unassigned => 0,
            Team::Spectator => TEAM_SPECTATOR,
            Team::Terrorist => TEAM_T,
            Team::CounterTerrorist => TEAM_CT,
        }
    }
}

impl Team {
    pub fn short_name(&self) -> &'static str {
        match self {
            Team::Unassigned => "-",
            Team::Spectator => "SPEC",
            Team::Terrorist => "T",
            Team::CounterTerrorist => "CT",
        }
    }
}

/// One player's state at a sampled tick.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerState {
    pub steam_id: String,
    pub name: String,
    pub team: Team,

    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub velocity: Vec3,
    /// Degrees, 0..360
    pub yaw: f32,
    /// Degrees, -90..90
    pub pitch: f32,

    pub health: u8,
    pub armor: u8,
    pub has_helmet: bool,
    pub has_defuser: bool,
    pub has_bomb: bool,

    pub is_alive: bool,
    pub is_ducking: bool,
    pub is_walking: bool,
    pub is_scoped: bool,
    pub is_defusing: bool,
    pub is_planting: bool,

    pub active_weapon: Option<String>,
    pub inventory: Vec<String>,
    pub money: u32,

    /// Remaining blind time in seconds.
    pub flash_duration: f32,
    /// Flash intensity, 0..255
    pub flash_alpha: u8,
}

impl PlayerState {
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    pub fn is_flashed(&self) -> bool {
        self.flash_duration > 0.0 && self.flash_alpha > 0
    }
}

/// A stored world snapshot at one tick.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct TickFrame {
    pub tick: u32,
    /// Seconds since the start of the demo.
    #[serde(default)]
    pub time: f64,
    #[serde(default)]
    pub players: Vec<PlayerState>,
}

impl TickFrame {
    pub fn player(&self, steam_id: &str) -> Option<&PlayerState> {
        self.players.iter().find(|p| p.steam_id == steam_id)
    }
}

/// Sort frames by tick and drop duplicate ticks so that ticks are strictly
/// increasing. Returns the number of frames removed.
pub fn normalize_frames(frames: &mut Vec<TickFrame>) -> usize {
    let sorted = frames.windows(2).all(|w| w[0].tick < w[1].tick);
    if sorted {
        return 0;
    }

    let before = frames.len();
    frames.sort_by_key(|f| f.tick);
    frames.dedup_by_key(|f| f.tick);
    let removed = before - frames.len();
    log::warn!(
        "Frames arrived out of order; sorted {} frames and dropped {} duplicate ticks",
        before,
        removed
    );
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(tick: u32) -> TickFrame {
        TickFrame {
            tick,
            ..Default::default()
        }
    }

    #[test]
    fn team_round_trips_through_team_number() {
        let team: Team = serde_json::from_str("3").unwrap();
        assert_eq!(team, Team::CounterTerrorist);
        assert_eq!(serde_json::to_string(&Team::Terrorist).unwrap(), "2");
        assert_eq!(Team::from(9), Team::Unassigned);
    }

    #[test]
    fn player_state_tolerates_missing_fields() {
        let json = r#"{"steamId":"7656","x":1.5,"y":-2.0,"isAlive":true,"team":2}"#;
        let player: PlayerState = serde_json::from_str(json).unwrap();
        assert_eq!(player.steam_id, "7656");
        assert_eq!(player.team, Team::Terrorist);
        assert!(player.is_alive);
        assert_eq!(player.health, 0);
        assert!(player.inventory.is_empty());
    }

    #[test]
    fn normalize_sorts_and_dedups() {
        let mut frames = vec![frame(16), frame(8), frame(16), frame(0)];
        let removed = normalize_frames(&mut frames);
        assert_eq!(removed, 1);
        let ticks: Vec<u32> = frames.iter().map(|f| f.tick).collect();
        assert_eq!(ticks, vec![0, 8, 16]);
    }

    #[test]
    fn normalize_leaves_sorted_input_alone() {
        let mut frames = vec![frame(0), frame(8), frame(16)];
        assert_eq!(normalize_frames(&mut frames), 0);
        assert_eq!(frames.len(), 3);
    }
}
