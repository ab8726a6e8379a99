use serde::{Deserialize, Serialize};

use crate::frame::{Team, Vec3};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Kill,
    Bomb,
    Grenade,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct KillEvent {
    pub tick: u32,
    #[serde(default)]
    pub attacker_steam_id: Option<String>,
    pub victim_steam_id: String,
    #[serde(default)]
    pub assister_steam_id: Option<String>,
    #[serde(default)]
    pub weapon: String,
    #[serde(default)]
    pub headshot: bool,
    #[serde(default)]
    pub wallbang: bool,
    #[serde(default)]
    pub through_smoke: bool,
    #[serde(default)]
    pub no_scope: bool,
    #[serde(default)]
    pub attacker_blind: bool,
    #[serde(default)]
    pub attacker_position: Option<Vec3>,
    #[serde(default)]
    pub victim_position: Vec3,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct BombEvent {
    pub tick: u32,
    #[serde(default)]
    pub player_steam_id: Option<String>,
    #[serde(default)]
    pub site: Option<String>,
    #[serde(default)]
    pub position: Vec3,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GrenadeKind {
    Smoke,
    Flashbang,
    #[serde(alias = "he")]
    HeGrenade,
    #[serde(alias = "incendiary")]
    Molotov,
    Decoy,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GrenadePhase {
    Throw,
    Detonate,
    Expire,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GrenadeEvent {
    pub tick: u32,
    pub grenade: GrenadeKind,
    pub phase: GrenadePhase,
    #[serde(default)]
    pub thrower_steam_id: Option<String>,
    #[serde(default)]
    pub thrower_team: Team,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub entity_id: Option<i64>,
    #[serde(default)]
    pub trajectory: Vec<Vec3>,
    /// Players blinded (flashbang) or damaged (HE) by the detonation.
    #[serde(default)]
    pub affected_players: Option<u32>,
}

/// Discrete world event, tagged by `type` on the wire.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayEvent {
    Kill(KillEvent),
    BombPlant(BombEvent),
    BombDefuse(BombEvent),
    BombExplode(BombEvent),
    BombBeginPlant(BombEvent),
    BombBeginDefuse(BombEvent),
    Grenade(GrenadeEvent),
}

impl ReplayEvent {
    pub fn tick(&self) -> u32 {
        match self {
            ReplayEvent::Kill(e) => e.tick,
            ReplayEvent::BombPlant(e)
            | ReplayEvent::BombDefuse(e)
            | ReplayEvent::BombExplode(e)
            | ReplayEvent::BombBeginPlant(e)
            | ReplayEvent::BombBeginDefuse(e) => e.tick,
            ReplayEvent::Grenade(e) => e.tick,
        }
    }

    pub fn category(&self) -> EventCategory {
        match self {
            ReplayEvent::Kill(_) => EventCategory::Kill,
            ReplayEvent::Grenade(_) => EventCategory::Grenade,
            _ => EventCategory::Bomb,
        }
    }

    /// Primary world position of the event (the victim for kills).
    pub fn position(&self) -> Vec3 {
        match self {
            ReplayEvent::Kill(e) => e.victim_position,
            ReplayEvent::BombPlant(e)
            | ReplayEvent::BombDefuse(e)
            | ReplayEvent::BombExplode(e)
            | ReplayEvent::BombBeginPlant(e)
            | ReplayEvent::BombBeginDefuse(e) => e.position,
            ReplayEvent::Grenade(e) => e.position,
        }
    }

    pub fn label(&self) -> String {
        match self {
            ReplayEvent::Kill(e) => {
                let hs = if e.headshot { " (hs)" } else { "" };
                format!("kill: {}{}", e.weapon, hs)
            }
            ReplayEvent::BombPlant(e) => match &e.site {
                Some(site) => format!("bomb planted at {}", site),
                None => "bomb planted".to_string(),
            },
            ReplayEvent::BombDefuse(_) => "bomb defused".to_string(),
            ReplayEvent::BombExplode(_) => "bomb exploded".to_string(),
            ReplayEvent::BombBeginPlant(_) => "planting".to_string(),
            ReplayEvent::BombBeginDefuse(_) => "defusing".to_string(),
            ReplayEvent::Grenade(e) => format!("{:?} {:?}", e.grenade, e.phase).to_lowercase(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kill_event_decodes_from_tagged_json() {
        let json = r#"{"type":"kill","tick":1200,"attackerSteamId":"1","victimSteamId":"2",
            "weapon":"ak47","headshot":true,"victimPosition":{"x":1.0,"y":2.0,"z":0.0}}"#;
        let event: ReplayEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.tick(), 1200);
        assert_eq!(event.category(), EventCategory::Kill);
        assert_eq!(event.position(), Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(event.label(), "kill: ak47 (hs)");
    }

    #[test]
    fn grenade_event_accepts_aliases() {
        let json = r#"{"type":"grenade","tick":900,"grenade":"incendiary","phase":"detonate","throwerTeam":3}"#;
        let event: ReplayEvent = serde_json::from_str(json).unwrap();
        match event {
            ReplayEvent::Grenade(g) => {
                assert_eq!(g.grenade, GrenadeKind::Molotov);
                assert_eq!(g.thrower_team, Team::CounterTerrorist);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn bomb_variants_share_category() {
        let json = r#"{"type":"bomb_begin_defuse","tick":3000,"site":"B"}"#;
        let event: ReplayEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.category(), EventCategory::Bomb);
        assert_eq!(event.label(), "defusing");
    }
}
