/// Gameplay tuning for the locally-controlled player.
///
/// Keep this separate from runtime/client configuration (tick rates, buffer
/// sizes, etc).

#[derive(Debug, Clone, Copy)]
pub struct PlayerTuning {
    /// Maximum movement speed in world units per second.
    pub max_speed: f32,

    /// World-space collision radius.
    pub radius: f32,

    /// Starting and maximum hit points.
    pub max_hp: i32,

    /// Seconds between primary-fire shots.
    pub fire_cooldown: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            max_speed: 220.0,
            radius: 14.0,
            max_hp: 100,
            fire_cooldown: 0.35,
        }
    }
}

/// XP required to go from `level` to `level + 1`.
pub fn xp_to_next_level(level: u32) -> i32 {
    5 + (level as i32) * 3
}
