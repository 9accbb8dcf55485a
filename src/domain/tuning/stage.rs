/// Per-stage wave scheduling parameters for the solo stage director.

/// Geometric layout used when a wave burst spawns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnPattern {
    Ring,
    Pincer,
    Box,
    Spiral,
    EdgeStream,
    Corners,
    Random,
}

const EARLY_PATTERNS: &[SpawnPattern] = &[SpawnPattern::Ring, SpawnPattern::Random, SpawnPattern::Corners];
const MID_PATTERNS: &[SpawnPattern] = &[
    SpawnPattern::Ring,
    SpawnPattern::Random,
    SpawnPattern::Corners,
    SpawnPattern::Box,
    SpawnPattern::Pincer,
    SpawnPattern::EdgeStream,
];
const LATE_PATTERNS: &[SpawnPattern] = &[
    SpawnPattern::Ring,
    SpawnPattern::Random,
    SpawnPattern::Corners,
    SpawnPattern::Box,
    SpawnPattern::Pincer,
    SpawnPattern::EdgeStream,
    SpawnPattern::Spiral,
];

/// Breather between a cleared stage and the next one.
pub const GRACE_SECONDS: f32 = 4.0;

/// Every Nth stage is a boss stage with normal waves suppressed.
pub const BOSS_STAGE_INTERVAL: u32 = 5;

#[derive(Debug, Clone, Copy)]
pub struct StageSpec {
    pub kill_goal: u32,
    pub wave_interval: f32,
    pub burst_min: u32,
    pub burst_max: u32,
    pub patterns: &'static [SpawnPattern],
    pub boss: bool,
}

pub fn spec_for(stage: u32) -> StageSpec {
    let stage = stage.max(1);
    let boss = stage % BOSS_STAGE_INTERVAL == 0;
    let burst_min = 2 + stage / 3;
    StageSpec {
        kill_goal: 8 + stage * 4,
        wave_interval: (3.2 - 0.12 * stage as f32).max(1.2),
        burst_min,
        burst_max: burst_min + 2 + stage / 4,
        patterns: match stage {
            1..=2 => EARLY_PATTERNS,
            3..=6 => MID_PATTERNS,
            _ => LATE_PATTERNS,
        },
        boss,
    }
}
