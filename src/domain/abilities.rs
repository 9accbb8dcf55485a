// Closed set of castable abilities and their static parameters.
//
// Abilities are a fixed enum selected by exhaustive match; cooldowns and damage
// are computed from the per-kind spec plus the player's current rank and build
// multipliers.

use crate::domain::tuning::combat::CombatTuning;
use serde::{Deserialize, Serialize};

pub const MAX_RANK: u8 = 5;
pub const SLOT_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityKey {
    Bolt,
    Beam,
    Dash,
    Nova,
    Zone,
}

impl AbilityKey {
    pub const ALL: [AbilityKey; 5] = [
        AbilityKey::Bolt,
        AbilityKey::Beam,
        AbilityKey::Dash,
        AbilityKey::Nova,
        AbilityKey::Zone,
    ];

    pub fn spec(self) -> AbilitySpec {
        match self {
            AbilityKey::Bolt => AbilitySpec {
                base_damage: 14.0,
                per_rank_damage: 6.0,
                base_cooldown: 2.5,
                per_rank_cooldown: 0.3,
                cooldown_floor: 0.8,
                range: 240.0,
                radius: 10.0,
                shape: EffectShape::Segment,
                needs_aim: true,
                duration: 0.0,
                tick_interval: 0.0,
            },
            AbilityKey::Beam => AbilitySpec {
                base_damage: 22.0,
                per_rank_damage: 9.0,
                base_cooldown: 6.0,
                per_rank_cooldown: 0.6,
                cooldown_floor: 2.5,
                range: 420.0,
                radius: 14.0,
                shape: EffectShape::Segment,
                needs_aim: true,
                duration: 0.0,
                tick_interval: 0.0,
            },
            AbilityKey::Dash => AbilitySpec {
                base_damage: 10.0,
                per_rank_damage: 4.0,
                base_cooldown: 5.0,
                per_rank_cooldown: 0.5,
                cooldown_floor: 2.0,
                range: 160.0,
                radius: 18.0,
                shape: EffectShape::Segment,
                needs_aim: true,
                duration: 0.0,
                tick_interval: 0.0,
            },
            AbilityKey::Nova => AbilitySpec {
                base_damage: 16.0,
                per_rank_damage: 7.0,
                base_cooldown: 7.0,
                per_rank_cooldown: 0.7,
                cooldown_floor: 3.0,
                range: 0.0,
                radius: 110.0,
                shape: EffectShape::CircleOnSelf,
                needs_aim: false,
                duration: 0.0,
                tick_interval: 0.0,
            },
            AbilityKey::Zone => AbilitySpec {
                base_damage: 6.0,
                per_rank_damage: 3.0,
                base_cooldown: 9.0,
                per_rank_cooldown: 0.8,
                cooldown_floor: 4.0,
                range: 200.0,
                radius: 80.0,
                shape: EffectShape::CircleAtAim,
                needs_aim: true,
                duration: 4.0,
                tick_interval: 0.5,
            },
        }
    }

    fn index(self) -> usize {
        match self {
            AbilityKey::Bolt => 0,
            AbilityKey::Beam => 1,
            AbilityKey::Dash => 2,
            AbilityKey::Nova => 3,
            AbilityKey::Zone => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectShape {
    /// Beam/dash/bolt style: a segment from the caster toward the aim direction.
    Segment,
    /// Burst around the caster.
    CircleOnSelf,
    /// Placed at range along the aim direction.
    CircleAtAim,
}

/// Static effect and cooldown parameters for one ability kind.
#[derive(Debug, Clone, Copy)]
pub struct AbilitySpec {
    pub base_damage: f32,
    pub per_rank_damage: f32,
    pub base_cooldown: f32,
    pub per_rank_cooldown: f32,
    pub cooldown_floor: f32,
    /// Segment length or placement distance, world units.
    pub range: f32,
    /// Circle radius, or segment half-width for segment shapes.
    pub radius: f32,
    pub shape: EffectShape,
    pub needs_aim: bool,
    /// Lifetime of the persistent effect; 0 means the effect resolves at cast.
    pub duration: f32,
    /// Minimum seconds between applied damage ticks and between PVP damage
    /// reports, independent of the visual tick rate.
    pub tick_interval: f32,
}

impl AbilitySpec {
    pub fn cooldown_for(&self, rank: u8, cooldown_mult: f32) -> f32 {
        (self.base_cooldown - self.per_rank_cooldown * f32::from(rank))
            .max(self.cooldown_floor)
            * cooldown_mult
    }

    pub fn damage_for(&self, rank: u8) -> f32 {
        self.base_damage + self.per_rank_damage * f32::from(rank.saturating_sub(1))
    }

    pub fn is_persistent(&self) -> bool {
        self.duration > 0.0
    }
}

/// Per-key ranks for the current run.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbilityRanks {
    ranks: [u8; 5],
}

impl AbilityRanks {
    pub fn rank(&self, key: AbilityKey) -> u8 {
        self.ranks[key.index()]
    }

    /// Raises the rank by one; returns false at the cap.
    pub fn raise(&mut self, key: AbilityKey) -> bool {
        let slot = &mut self.ranks[key.index()];
        if *slot >= MAX_RANK {
            return false;
        }
        *slot += 1;
        true
    }

    pub fn total(&self) -> u32 {
        self.ranks.iter().map(|r| u32::from(*r)).sum()
    }
}

/// Run-wide multipliers derived from the current build.
#[derive(Debug, Clone, Copy)]
pub struct BuildModifiers {
    pub damage: f32,
    pub crit_chance: f32,
    pub crit_multiplier: f32,
    pub cooldown: f32,
    pub range: f32,
}

impl Default for BuildModifiers {
    fn default() -> Self {
        Self {
            damage: 1.0,
            crit_chance: 0.05,
            crit_multiplier: 2.0,
            cooldown: 1.0,
            range: 1.0,
        }
    }
}

impl BuildModifiers {
    /// Simple synergy scaling: every learned rank nudges the whole build.
    pub fn from_ranks(ranks: &AbilityRanks, tuning: &CombatTuning) -> Self {
        let total = ranks.total() as f32;
        Self {
            damage: 1.0 + tuning.damage_per_rank * total,
            crit_chance: tuning.base_crit_chance + tuning.crit_chance_per_rank * total,
            crit_multiplier: tuning.crit_multiplier,
            cooldown: (1.0 - tuning.cooldown_per_rank * total).max(tuning.cooldown_mult_floor),
            range: 1.0 + tuning.range_per_rank * total,
        }
    }
}
