/// Build/synergy scaling applied on top of ability and projectile base values.

#[derive(Debug, Clone, Copy)]
pub struct CombatTuning {
    pub base_crit_chance: f32,
    pub crit_chance_per_rank: f32,
    pub crit_multiplier: f32,
    /// Damage multiplier gained per total learned rank.
    pub damage_per_rank: f32,
    /// Cooldown multiplier shaved per total learned rank.
    pub cooldown_per_rank: f32,
    pub cooldown_mult_floor: f32,
    /// Range multiplier gained per total learned rank.
    pub range_per_rank: f32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            base_crit_chance: 0.05,
            crit_chance_per_rank: 0.004,
            crit_multiplier: 2.0,
            damage_per_rank: 0.03,
            cooldown_per_rank: 0.01,
            cooldown_mult_floor: 0.5,
            range_per_rank: 0.02,
        }
    }
}
