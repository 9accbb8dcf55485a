// Gameplay tuning, separate from runtime configuration.

pub mod combat;
pub mod enemy;
pub mod player;
pub mod projectile;
pub mod snapshot;
pub mod stage;

use crate::domain::systems::movement::ArenaBounds;

/// Bundle of every tuning table a match session needs.
#[derive(Debug, Clone, Copy, Default)]
pub struct GameTuning {
    pub player: player::PlayerTuning,
    pub projectile: projectile::ProjectileTuning,
    pub combat: combat::CombatTuning,
    pub snapshot: snapshot::SnapshotTuning,
    pub bounds: ArenaBounds,
    pub input: InputTuning,
}

#[derive(Debug, Clone, Copy)]
pub struct InputTuning {
    /// Seconds between outbound input reports (~20 Hz), well below frame rate.
    pub report_interval: f32,
}

impl Default for InputTuning {
    fn default() -> Self {
        Self {
            report_interval: 0.05,
        }
    }
}
