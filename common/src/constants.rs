/// CS2 servers simulate at 64 ticks per second.
pub const DEFAULT_TICK_RATE: u32 = 64;

/// The parser keeps one frame every 8 ticks for 2D replays.
pub const DEFAULT_SAMPLE_INTERVAL: u32 = 8;

pub const TEAM_SPECTATOR: u8 = 1;
pub const TEAM_T: u8 = 2;
pub const TEAM_CT: u8 = 3;
