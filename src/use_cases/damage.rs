// Damage arbitration router: the single chokepoint for every damage-causing
// event. Locally-simulated enemies take damage immediately; networked targets
// only ever get a report sent on their behalf — their health belongs to the
// authority.

use crate::domain::abilities::{AbilityKey, BuildModifiers};
use crate::domain::ports::Presentation;
use crate::domain::state::{SimEnemy, TargetRef};
use crate::use_cases::types::ClientCommand;
use rand::Rng;
use rand::rngs::SmallRng;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
pub struct RolledDamage {
    pub amount: i32,
    pub crit: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct LocalHit {
    pub amount: i32,
    pub crit: bool,
    pub killed: bool,
}

pub struct DamageRouter {
    clock: f32,
    /// Earliest clock at which the next PVP damage report per ability key may
    /// be sent; continuous effects must not outpace their designed tick.
    next_report_at: HashMap<AbilityKey, f32>,
}

impl DamageRouter {
    pub fn new() -> Self {
        Self {
            clock: 0.0,
            next_report_at: HashMap::new(),
        }
    }

    pub fn tick(&mut self, dt: f32) {
        self.clock += dt;
    }

    /// Applies build multipliers and a crit roll; floored, never below 1.
    pub fn roll(&self, raw: f32, mods: &BuildModifiers, rng: &mut SmallRng) -> RolledDamage {
        let crit = rng.gen_range(0.0..1.0f32) < mods.crit_chance;
        let mult = if crit { mods.crit_multiplier } else { 1.0 };
        let amount = ((raw * mods.damage * mult).floor() as i32).max(1);
        RolledDamage { amount, crit }
    }

    /// Local-enemy path: mutate health now and report whether the hit killed.
    pub fn hit_local<P: Presentation>(
        &mut self,
        enemy: &mut SimEnemy,
        raw: f32,
        mods: &BuildModifiers,
        rng: &mut SmallRng,
        presentation: &mut P,
    ) -> LocalHit {
        let rolled = self.roll(raw, mods, rng);
        let hp = enemy.hp.apply_damage(rolled.amount);
        presentation.damage_number(enemy.x, enemy.y, rolled.amount, rolled.crit);
        info!(
            enemy_id = enemy.id,
            amount = rolled.amount,
            crit = rolled.crit,
            hp,
            "enemy hit"
        );
        LocalHit {
            amount: rolled.amount,
            crit: rolled.crit,
            killed: hp <= 0,
        }
    }

    /// Networked path: never mutates health. Emits a uuid-tagged report for
    /// the authority (which dedupes retransmits by that id) and shows only
    /// optimistic feedback. Returns None when the per-ability gate holds the
    /// report back.
    #[allow(clippy::too_many_arguments)]
    pub fn hit_networked<P: Presentation>(
        &mut self,
        target: TargetRef,
        x: f32,
        y: f32,
        raw: f32,
        ability: Option<AbilityKey>,
        mods: &BuildModifiers,
        rng: &mut SmallRng,
        presentation: &mut P,
        outbound: &mut VecDeque<ClientCommand>,
    ) -> Option<RolledDamage> {
        debug_assert!(target.is_networked());

        // PVP-directed continuous effects are gated to their designed tick
        // interval, independent of the visual tick rate.
        if matches!(target, TargetRef::Opponent(_)) {
            if let Some(key) = ability {
                let interval = key.spec().tick_interval;
                if interval > 0.0 {
                    let gate = self.next_report_at.entry(key).or_insert(0.0);
                    if self.clock < *gate {
                        debug!(?key, "damage report gated");
                        return None;
                    }
                    *gate = self.clock + interval;
                }
            }
        }

        let rolled = self.roll(raw, mods, rng);
        presentation.damage_number(x, y, rolled.amount, rolled.crit);
        outbound.push_back(ClientCommand::DamageReport {
            hit_id: Uuid::new_v4(),
            target_id: target.id(),
            amount: rolled.amount,
            ability,
        });
        Some(rolled)
    }
}

impl Default for DamageRouter {
    fn default() -> Self {
        Self::new()
    }
}
