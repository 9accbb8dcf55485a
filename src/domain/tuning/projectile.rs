/// Gameplay tuning for primary-fire projectiles.

#[derive(Debug, Clone, Copy)]
pub struct ProjectileTuning {
    /// Initial projectile speed in world units per second.
    pub speed: f32,

    /// Lifetime in seconds before the projectile is despawned.
    pub life_time: f32,

    /// World-space collision radius.
    pub radius: f32,

    /// Raw damage before build multipliers.
    pub damage: f32,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            speed: 420.0,
            life_time: 1.2,
            radius: 5.0,
            damage: 10.0,
        }
    }
}
