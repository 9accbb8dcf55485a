// Tracing-backed presentation sink for headless runs: every visual/audio
// event becomes a structured log line instead of a draw call.

use crate::domain::abilities::AbilityKey;
use crate::domain::ports::{HudTarget, Presentation, SoundCue};
use crate::domain::state::{EnemyKind, MatchOutcome, MatchPhase};
use tracing::{debug, info};

pub struct LogPresentation;

impl Presentation for LogPresentation {
    fn enemy_spawned(&mut self, id: u64, kind: EnemyKind, x: f32, y: f32) {
        debug!(id, ?kind, x, y, "enemy spawned");
    }

    fn opponent_spawned(&mut self, id: u64, x: f32, y: f32) {
        info!(id, x, y, "opponent sighted");
    }

    fn entity_despawned(&mut self, id: u64) {
        debug!(id, "entity despawned");
    }

    fn damage_number(&mut self, x: f32, y: f32, amount: i32, crit: bool) {
        debug!(x, y, amount, crit, "damage number");
    }

    fn health_changed(&mut self, target: HudTarget, hp: i32, max_hp: i32) {
        debug!(?target, hp, max_hp, "health changed");
    }

    fn cooldown_started(&mut self, slot: usize, seconds: f32) {
        debug!(slot, seconds, "cooldown started");
    }

    fn skill_effect(&mut self, key: AbilityKey, x: f32, y: f32, dir_x: f32, dir_y: f32, rank: u8) {
        debug!(?key, x, y, dir_x, dir_y, rank, "skill effect");
    }

    fn countdown_started(&mut self, seconds: f32) {
        info!(seconds, "countdown started");
    }

    fn phase_changed(&mut self, phase: MatchPhase) {
        info!(?phase, "phase changed");
    }

    fn match_ended(&mut self, outcome: MatchOutcome, won: bool) {
        info!(?outcome, won, "match ended");
    }

    fn stage_advanced(&mut self, stage: u32) {
        info!(stage, "stage advanced");
    }

    fn upgrade_ready(&mut self, points: u32) {
        info!(points, "upgrade points available");
    }

    fn sound(&mut self, cue: SoundCue) {
        debug!(?cue, "sound cue");
    }
}
