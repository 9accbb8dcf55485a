// Stage director for solo runs: schedules enemy waves, advances stages on
// kill goals, and holds normal spawning back on boss stages.

use crate::domain::state::EnemyKind;
use crate::domain::systems::movement::ArenaBounds;
use crate::domain::tuning::stage::{self, GRACE_SECONDS, SpawnPattern, StageSpec};
use rand::Rng;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::f32::consts::TAU;
use tracing::info;

/// Distance from the player at which ring/box/spiral layouts materialize.
const SPAWN_RADIUS: f32 = 260.0;
/// Initial delay before the first wave of a stage.
const FIRST_WAVE_DELAY: f32 = 1.0;

#[derive(Debug, Clone, Copy)]
pub struct SpawnOrder {
    pub kind: EnemyKind,
    pub x: f32,
    pub y: f32,
}

/// What one director tick produced.
#[derive(Debug, Default)]
pub struct DirectorFrame {
    pub spawns: Vec<SpawnOrder>,
    /// Set when the grace period ended and a new stage began.
    pub advanced_to: Option<u32>,
}

pub struct StageDirector {
    stage: u32,
    spec: StageSpec,
    stage_kills: u32,
    wave_timer: f32,
    grace_timer: f32,
    boss_pending: bool,
    boss_alive: bool,
    bounds: ArenaBounds,
    rng: SmallRng,
}

impl StageDirector {
    pub fn new(seed: u64, bounds: ArenaBounds) -> Self {
        let spec = stage::spec_for(1);
        Self {
            stage: 1,
            spec,
            stage_kills: 0,
            wave_timer: FIRST_WAVE_DELAY,
            grace_timer: 0.0,
            boss_pending: spec.boss,
            boss_alive: false,
            bounds,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn stage(&self) -> u32 {
        self.stage
    }

    pub fn stage_kills(&self) -> u32 {
        self.stage_kills
    }

    pub fn kill_goal(&self) -> u32 {
        self.spec.kill_goal
    }

    pub fn in_grace(&self) -> bool {
        self.grace_timer > 0.0
    }

    pub fn boss_alive(&self) -> bool {
        self.boss_alive
    }

    /// Advances timers and emits this frame's spawns.
    pub fn tick(&mut self, dt: f32, player_x: f32, player_y: f32) -> DirectorFrame {
        let mut frame = DirectorFrame::default();

        if self.grace_timer > 0.0 {
            self.grace_timer -= dt;
            if self.grace_timer <= 0.0 {
                self.advance_stage();
                frame.advanced_to = Some(self.stage);
            }
            return frame;
        }

        if self.spec.boss {
            // Boss stages suppress waves until the boss falls.
            if self.boss_pending {
                self.boss_pending = false;
                self.boss_alive = true;
                frame.spawns.push(self.edge_spawn(EnemyKind::Boss));
                info!(stage = self.stage, "boss spawned");
            }
            return frame;
        }

        self.wave_timer -= dt;
        if self.wave_timer <= 0.0 {
            self.wave_timer += self.spec.wave_interval;
            let burst = self
                .rng
                .gen_range(self.spec.burst_min..=self.spec.burst_max);
            let pattern = self.spec.patterns[self.rng.gen_range(0..self.spec.patterns.len())];
            frame.spawns = self.layout(pattern, burst, player_x, player_y);
        }
        frame
    }

    /// Records one kill; returns true when it cleared the stage.
    pub fn record_kill(&mut self, was_boss: bool) -> bool {
        self.stage_kills += 1;
        let cleared = if self.spec.boss {
            if was_boss {
                self.boss_alive = false;
                true
            } else {
                false
            }
        } else {
            self.stage_kills >= self.spec.kill_goal
        };
        if cleared && self.grace_timer <= 0.0 {
            self.grace_timer = GRACE_SECONDS;
            info!(stage = self.stage, kills = self.stage_kills, "stage cleared");
        }
        cleared
    }

    fn advance_stage(&mut self) {
        self.stage += 1;
        self.spec = stage::spec_for(self.stage);
        self.stage_kills = 0;
        self.wave_timer = FIRST_WAVE_DELAY;
        self.boss_pending = self.spec.boss;
        self.boss_alive = false;
    }

    fn kind_for_roll(&mut self) -> EnemyKind {
        let roll = self.rng.gen_range(0.0..1.0f32);
        if self.stage >= 4 && roll < 0.12 {
            EnemyKind::Tank
        } else if self.stage >= 3 && roll < 0.40 {
            EnemyKind::Runner
        } else {
            EnemyKind::Grunt
        }
    }

    fn clamped(&self, x: f32, y: f32, kind: EnemyKind) -> SpawnOrder {
        let (x, y) = self.bounds.clamp(x, y);
        SpawnOrder { kind, x, y }
    }

    fn edge_spawn(&mut self, kind: EnemyKind) -> SpawnOrder {
        let b = self.bounds;
        let (x, y) = match self.rng.gen_range(0..4u8) {
            0 => (b.min_x, self.rng.gen_range(b.min_y..b.max_y)),
            1 => (b.max_x, self.rng.gen_range(b.min_y..b.max_y)),
            2 => (self.rng.gen_range(b.min_x..b.max_x), b.min_y),
            _ => (self.rng.gen_range(b.min_x..b.max_x), b.max_y),
        };
        SpawnOrder { kind, x, y }
    }

    fn layout(&mut self, pattern: SpawnPattern, count: u32, px: f32, py: f32) -> Vec<SpawnOrder> {
        let mut spawns = Vec::with_capacity(count as usize);
        match pattern {
            SpawnPattern::Ring => {
                let offset = self.rng.gen_range(0.0..TAU);
                for i in 0..count {
                    let angle = offset + TAU * i as f32 / count as f32;
                    let kind = self.kind_for_roll();
                    spawns.push(self.clamped(
                        px + angle.cos() * SPAWN_RADIUS,
                        py + angle.sin() * SPAWN_RADIUS,
                        kind,
                    ));
                }
            }
            SpawnPattern::Pincer => {
                // Two clusters closing in from opposite sides.
                for i in 0..count {
                    let side = if i % 2 == 0 { -1.0 } else { 1.0 };
                    let jitter = self.rng.gen_range(-40.0..40.0f32);
                    let kind = self.kind_for_roll();
                    spawns.push(self.clamped(
                        px + side * SPAWN_RADIUS,
                        py + jitter + (i / 2) as f32 * 26.0 * side,
                        kind,
                    ));
                }
            }
            SpawnPattern::Box => {
                for i in 0..count {
                    let t = i as f32 / count.max(1) as f32;
                    // Walk the perimeter of a square around the player.
                    let (dx, dy) = match (t * 4.0) as u32 {
                        0 => (-1.0 + 8.0 * t, -1.0),
                        1 => (1.0, -1.0 + 8.0 * (t - 0.25)),
                        2 => (1.0 - 8.0 * (t - 0.5), 1.0),
                        _ => (-1.0, 1.0 - 8.0 * (t - 0.75)),
                    };
                    let kind = self.kind_for_roll();
                    spawns.push(self.clamped(
                        px + dx * SPAWN_RADIUS,
                        py + dy * SPAWN_RADIUS,
                        kind,
                    ));
                }
            }
            SpawnPattern::Spiral => {
                let offset = self.rng.gen_range(0.0..TAU);
                for i in 0..count {
                    let angle = offset + i as f32 * 0.9;
                    let dist = SPAWN_RADIUS + i as f32 * 22.0;
                    let kind = self.kind_for_roll();
                    spawns.push(self.clamped(
                        px + angle.cos() * dist,
                        py + angle.sin() * dist,
                        kind,
                    ));
                }
            }
            SpawnPattern::EdgeStream => {
                // A column marching in from one arena edge.
                let anchor = self.edge_spawn(EnemyKind::Grunt);
                for i in 0..count {
                    let kind = self.kind_for_roll();
                    let x = anchor.x + self.rng.gen_range(-20.0..20.0f32);
                    let y = anchor.y + i as f32 * 28.0 - count as f32 * 14.0;
                    spawns.push(self.clamped(x, y, kind));
                }
            }
            SpawnPattern::Corners => {
                let b = self.bounds;
                let corners = [
                    (b.min_x, b.min_y),
                    (b.max_x, b.min_y),
                    (b.min_x, b.max_y),
                    (b.max_x, b.max_y),
                ];
                for i in 0..count {
                    let (cx, cy) = corners[i as usize % corners.len()];
                    let kind = self.kind_for_roll();
                    let x = cx + self.rng.gen_range(-30.0..30.0f32);
                    let y = cy + self.rng.gen_range(-30.0..30.0f32);
                    spawns.push(self.clamped(x, y, kind));
                }
            }
            SpawnPattern::Random => {
                let b = self.bounds;
                for _ in 0..count {
                    let mut x = self.rng.gen_range(b.min_x..b.max_x);
                    let mut y = self.rng.gen_range(b.min_y..b.max_y);
                    // Keep random spawns out of the player's face.
                    let dx = x - px;
                    let dy = y - py;
                    let dist = (dx * dx + dy * dy).sqrt();
                    if dist < 120.0 && dist > f32::EPSILON {
                        x = px + dx / dist * 120.0;
                        y = py + dy / dist * 120.0;
                    }
                    let kind = self.kind_for_roll();
                    spawns.push(self.clamped(x, y, kind));
                }
            }
        }
        spawns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn director() -> StageDirector {
        StageDirector::new(42, ArenaBounds::default())
    }

    fn run_until_spawns(d: &mut StageDirector, max_seconds: f32) -> Vec<SpawnOrder> {
        let dt = 1.0 / 60.0;
        let mut elapsed = 0.0;
        while elapsed < max_seconds {
            let frame = d.tick(dt, 0.0, 0.0);
            if !frame.spawns.is_empty() {
                return frame.spawns;
            }
            elapsed += dt;
        }
        panic!("no spawns within {max_seconds}s");
    }

    #[test]
    fn when_the_wave_timer_fires_then_burst_size_is_within_bounds() {
        let mut d = director();
        let spawns = run_until_spawns(&mut d, 10.0);
        let spec = stage::spec_for(1);
        assert!(spawns.len() as u32 >= spec.burst_min);
        assert!(spawns.len() as u32 <= spec.burst_max);
        for s in &spawns {
            assert!(d.bounds.contains(s.x, s.y));
        }
    }

    #[test]
    fn when_the_kill_goal_is_met_then_grace_starts_and_the_stage_advances() {
        let mut d = director();
        let goal = d.kill_goal();
        for _ in 0..goal - 1 {
            assert!(!d.record_kill(false));
        }
        assert!(d.record_kill(false));
        assert!(d.in_grace());
        assert_eq!(d.stage(), 1);

        // No spawns during grace; the stage advances when it ends.
        let frame = d.tick(GRACE_SECONDS + 0.1, 0.0, 0.0);
        assert!(frame.spawns.is_empty());
        assert_eq!(frame.advanced_to, Some(2));
        assert_eq!(d.stage(), 2);
        assert_eq!(d.stage_kills(), 0);
    }

    #[test]
    fn when_a_boss_stage_begins_then_waves_are_suppressed_until_the_boss_dies() {
        let mut d = director();
        // Clear stages 1..=4 to reach the boss stage.
        for _ in 0..4 {
            let goal = d.kill_goal();
            for _ in 0..goal {
                d.record_kill(false);
            }
            d.tick(GRACE_SECONDS + 0.1, 0.0, 0.0);
        }
        assert_eq!(d.stage(), 5);

        let first = d.tick(1.0 / 60.0, 0.0, 0.0);
        assert_eq!(first.spawns.len(), 1);
        assert_eq!(first.spawns[0].kind, EnemyKind::Boss);
        assert!(d.boss_alive());

        // Plenty of time passes: nothing else spawns while the boss lives.
        let dt = 1.0 / 60.0;
        for _ in 0..600 {
            let frame = d.tick(dt, 0.0, 0.0);
            assert!(frame.spawns.is_empty());
        }

        // Non-boss kills do not clear a boss stage.
        assert!(!d.record_kill(false));
        assert!(d.record_kill(true));
        assert!(d.in_grace());
    }
}
