#![allow(dead_code)]

use common::{BombEvent, KillEvent, PlayerState, ReplayEvent, RoundMetadata, Team, TickFrame};

pub fn frames_between(start: u32, end: u32, step: u32) -> Vec<TickFrame> {
    (start..=end)
        .step_by(step as usize)
        .map(|tick| TickFrame {
            tick,
            time: tick as f64 / 64.0,
            players: Vec::new(),
        })
        .collect()
}

pub fn player(steam_id: &str, x: f32, y: f32, yaw: f32) -> PlayerState {
    PlayerState {
        steam_id: steam_id.to_string(),
        name: format!("player-{}", steam_id),
        team: Team::Terrorist,
        x,
        y,
        yaw,
        health: 100,
        is_alive: true,
        ..Default::default()
    }
}

pub fn frame_with(tick: u32, players: Vec<PlayerState>) -> TickFrame {
    TickFrame {
        tick,
        time: tick as f64 / 64.0,
        players,
    }
}

pub fn metadata(start_tick: u32, end_tick: u32) -> RoundMetadata {
    RoundMetadata {
        round_number: 1,
        start_tick,
        end_tick,
        ..Default::default()
    }
}

pub fn kill(tick: u32) -> ReplayEvent {
    ReplayEvent::Kill(KillEvent {
        tick,
        victim_steam_id: "2".to_string(),
        weapon: "ak47".to_string(),
        ..Default::default()
    })
}

pub fn bomb_plant(tick: u32) -> ReplayEvent {
    ReplayEvent::BombPlant(BombEvent {
        tick,
        site: Some("A".to_string()),
        ..Default::default()
    })
}

pub fn frame_line(tick: u32) -> String {
    format!(
        "{{\"type\":\"frame\",\"data\":{{\"tick\":{},\"time\":{},\"players\":[]}}}}\n",
        tick,
        tick as f64 / 64.0
    )
}
