/// Gameplay tuning for locally-simulated enemies, scaled by stage.

use crate::domain::state::EnemyKind;

/// Resolved per-spawn stats for one enemy.
#[derive(Debug, Clone, Copy)]
pub struct EnemyStats {
    pub hp: i32,
    pub speed: f32,
    pub radius: f32,
    pub contact_damage: i32,
    pub xp_reward: i32,
}

/// Seconds between contact hits from the same enemy.
pub const CONTACT_INTERVAL: f32 = 0.8;

impl EnemyStats {
    pub fn for_kind(kind: EnemyKind, stage: u32) -> Self {
        let stage = stage.max(1) as i32;
        match kind {
            EnemyKind::Grunt => Self {
                hp: 20 + stage * 6,
                speed: 70.0,
                radius: 12.0,
                contact_damage: 6 + stage,
                xp_reward: 2,
            },
            EnemyKind::Runner => Self {
                hp: 12 + stage * 4,
                speed: 130.0,
                radius: 10.0,
                contact_damage: 4 + stage,
                xp_reward: 3,
            },
            EnemyKind::Tank => Self {
                hp: 60 + stage * 14,
                speed: 45.0,
                radius: 18.0,
                contact_damage: 10 + stage * 2,
                xp_reward: 6,
            },
            EnemyKind::Boss => Self {
                hp: 300 + stage * 80,
                speed: 55.0,
                radius: 30.0,
                contact_damage: 18 + stage * 2,
                xp_reward: 30,
            },
        }
    }
}
