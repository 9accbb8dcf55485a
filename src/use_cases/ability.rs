// Ability cast coordinator: slots, cooldowns, aim validation, synchronous
// effect resolution, and the level-up pick negotiation with the authority.

use crate::domain::abilities::{
    AbilityKey, AbilityRanks, BuildModifiers, EffectShape, MAX_RANK, SLOT_COUNT,
};
use crate::domain::state::{TargetPoint, TargetRef};
use crate::domain::systems::combat;
use crate::use_cases::types::ClientCommand;
use tracing::debug;

/// Aim vectors shorter than this cannot orient an aim-requiring ability.
const MIN_AIM_MAGNITUDE: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastError {
    EmptySlot,
    NotLearned,
    OnCooldown,
    NoAim,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CastHit {
    pub target: TargetRef,
    pub x: f32,
    pub y: f32,
}

/// Everything the session needs to apply a successful cast.
#[derive(Debug, Clone, PartialEq)]
pub struct CastOutcome {
    pub key: AbilityKey,
    pub rank: u8,
    pub raw_damage: f32,
    pub dir_x: f32,
    pub dir_y: f32,
    /// Effective reach after the build's range multiplier.
    pub range: f32,
    pub radius: f32,
    pub cooldown: f32,
    /// Immediate hits; empty for persistent effects, which damage on their
    /// own ticks instead.
    pub hits: Vec<CastHit>,
}

/// At most one level-up pick may be in flight toward the authority.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingPick {
    pub key: AbilityKey,
    pub submitted_at: f32,
}

pub struct AbilityCoordinator {
    ranks: AbilityRanks,
    slots: [Option<AbilityKey>; SLOT_COUNT],
    cooldowns: [f32; SLOT_COUNT],
    pending_pick: Option<PendingPick>,
    upgrade_points: u32,
    clock: f32,
}

impl AbilityCoordinator {
    /// Fresh loadout: the starter ability is learned and slotted, the rest is
    /// earned through level-up picks.
    pub fn new() -> Self {
        let mut ranks = AbilityRanks::default();
        ranks.raise(AbilityKey::Bolt);
        let mut slots = [None; SLOT_COUNT];
        slots[0] = Some(AbilityKey::Bolt);
        Self {
            ranks,
            slots,
            cooldowns: [0.0; SLOT_COUNT],
            pending_pick: None,
            upgrade_points: 0,
            clock: 0.0,
        }
    }

    pub fn tick(&mut self, dt: f32) {
        self.clock += dt;
        for cd in &mut self.cooldowns {
            *cd = (*cd - dt).max(0.0);
        }
    }

    pub fn ranks(&self) -> &AbilityRanks {
        &self.ranks
    }

    pub fn rank(&self, key: AbilityKey) -> u8 {
        self.ranks.rank(key)
    }

    pub fn slot(&self, slot: usize) -> Option<AbilityKey> {
        self.slots.get(slot).copied().flatten()
    }

    pub fn cooldown_remaining(&self, slot: usize) -> f32 {
        self.cooldowns.get(slot).copied().unwrap_or(0.0)
    }

    pub fn upgrade_points(&self) -> u32 {
        self.upgrade_points
    }

    pub fn pending_pick(&self) -> Option<PendingPick> {
        self.pending_pick
    }

    pub fn grant_upgrade_point(&mut self) {
        self.upgrade_points += 1;
    }

    /// Resolves a cast: validation, aim, hit-testing, cooldown start. A second
    /// request while the slot cools down is rejected, never queued.
    pub fn cast(
        &mut self,
        slot: usize,
        aim_x: f32,
        aim_y: f32,
        origin: (f32, f32),
        targets: &[TargetPoint],
        mods: &BuildModifiers,
    ) -> Result<CastOutcome, CastError> {
        let key = self.slot(slot).ok_or(CastError::EmptySlot)?;
        let rank = self.ranks.rank(key);
        if rank == 0 {
            return Err(CastError::NotLearned);
        }
        if self.cooldowns[slot] > 0.0 {
            return Err(CastError::OnCooldown);
        }

        let spec = key.spec();
        let aim_mag = (aim_x * aim_x + aim_y * aim_y).sqrt();
        if spec.needs_aim && aim_mag < MIN_AIM_MAGNITUDE {
            return Err(CastError::NoAim);
        }
        let (dir_x, dir_y) = if aim_mag >= MIN_AIM_MAGNITUDE {
            (aim_x / aim_mag, aim_y / aim_mag)
        } else {
            (0.0, 0.0)
        };

        let range = spec.range * mods.range;
        let radius = spec.radius * mods.range;
        let (ox, oy) = origin;

        let hits = if spec.is_persistent() {
            Vec::new()
        } else {
            match spec.shape {
                EffectShape::Segment => {
                    let ex = ox + dir_x * range;
                    let ey = oy + dir_y * range;
                    targets
                        .iter()
                        .filter(|t| {
                            combat::segment_hits_circle(ox, oy, ex, ey, t.x, t.y, radius + t.radius)
                        })
                        .map(|t| CastHit {
                            target: t.target,
                            x: t.x,
                            y: t.y,
                        })
                        .collect()
                }
                EffectShape::CircleOnSelf => targets
                    .iter()
                    .filter(|t| combat::circles_overlap(ox, oy, radius, t.x, t.y, t.radius))
                    .map(|t| CastHit {
                        target: t.target,
                        x: t.x,
                        y: t.y,
                    })
                    .collect(),
                EffectShape::CircleAtAim => {
                    let cx = ox + dir_x * range;
                    let cy = oy + dir_y * range;
                    targets
                        .iter()
                        .filter(|t| combat::circles_overlap(cx, cy, radius, t.x, t.y, t.radius))
                        .map(|t| CastHit {
                            target: t.target,
                            x: t.x,
                            y: t.y,
                        })
                        .collect()
                }
            }
        };

        self.cooldowns[slot] = spec.cooldown_for(rank, mods.cooldown);
        Ok(CastOutcome {
            key,
            rank,
            raw_damage: spec.damage_for(rank),
            dir_x,
            dir_y,
            range,
            radius,
            cooldown: self.cooldowns[slot],
            hits,
        })
    }

    /// Solo path: a pick applies immediately.
    pub fn apply_pick(&mut self, key: AbilityKey) -> bool {
        if self.upgrade_points == 0 {
            return false;
        }
        if !self.ranks.raise(key) {
            return false;
        }
        self.upgrade_points -= 1;
        self.auto_assign(key);
        true
    }

    /// Networked path: submit the pick and wait for the authority's verdict.
    pub fn propose_pick(&mut self, key: AbilityKey) -> Option<ClientCommand> {
        if self.upgrade_points == 0 || self.pending_pick.is_some() {
            return None;
        }
        if self.ranks.rank(key) >= MAX_RANK {
            return None;
        }
        self.pending_pick = Some(PendingPick {
            key,
            submitted_at: self.clock,
        });
        Some(ClientCommand::PickRequest { key })
    }

    /// Applies the authority's verdict. A confirmation that matches no pending
    /// pick is stale and ignored.
    pub fn resolve_pick(&mut self, key: AbilityKey, accepted: bool) -> bool {
        match self.pending_pick {
            Some(pending) if pending.key == key => {
                self.pending_pick = None;
                if accepted && self.ranks.raise(key) {
                    self.upgrade_points = self.upgrade_points.saturating_sub(1);
                    self.auto_assign(key);
                    true
                } else {
                    false
                }
            }
            _ => {
                debug!(?key, "pick resolution without matching pending pick");
                false
            }
        }
    }

    /// A newly learned ability takes the first free slot.
    fn auto_assign(&mut self, key: AbilityKey) {
        if self.slots.contains(&Some(key)) {
            return;
        }
        if let Some(free) = self.slots.iter_mut().find(|s| s.is_none()) {
            *free = Some(key);
        }
    }
}

impl Default for AbilityCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opponent_at(x: f32, y: f32) -> TargetPoint {
        TargetPoint {
            target: TargetRef::Opponent(9),
            x,
            y,
            radius: 14.0,
        }
    }

    fn mods() -> BuildModifiers {
        BuildModifiers::default()
    }

    #[test]
    fn when_the_cooldown_window_is_open_then_a_second_cast_is_rejected() {
        let mut coord = AbilityCoordinator::new();
        let outcome = coord
            .cast(0, 1.0, 0.0, (0.0, 0.0), &[], &mods())
            .expect("first cast should succeed");
        let duration = outcome.cooldown;
        assert!(duration > 0.0);

        // Rejected at any point strictly inside (T, T+D).
        coord.tick(duration * 0.5);
        assert_eq!(
            coord.cast(0, 1.0, 0.0, (0.0, 0.0), &[], &mods()),
            Err(CastError::OnCooldown)
        );
        // No state was mutated by the rejected attempt.
        assert!(coord.cooldown_remaining(0) > 0.0);

        // Succeeds once the full duration has elapsed.
        coord.tick(duration * 0.5 + 1e-4);
        assert!(coord.cast(0, 1.0, 0.0, (0.0, 0.0), &[], &mods()).is_ok());
    }

    #[test]
    fn when_the_aim_vector_is_near_zero_then_aimed_casts_are_rejected() {
        let mut coord = AbilityCoordinator::new();
        assert_eq!(
            coord.cast(0, 0.0, 0.0, (0.0, 0.0), &[], &mods()),
            Err(CastError::NoAim)
        );
        // Nothing was consumed by the rejection.
        assert_eq!(coord.cooldown_remaining(0), 0.0);
    }

    #[test]
    fn when_the_slot_is_empty_then_the_cast_is_rejected() {
        let mut coord = AbilityCoordinator::new();
        assert_eq!(
            coord.cast(2, 1.0, 0.0, (0.0, 0.0), &[], &mods()),
            Err(CastError::EmptySlot)
        );
    }

    #[test]
    fn when_a_segment_cast_crosses_a_target_then_it_hits() {
        let mut coord = AbilityCoordinator::new();
        let targets = [opponent_at(100.0, 4.0), opponent_at(100.0, 200.0)];
        let outcome = coord
            .cast(0, 1.0, 0.0, (0.0, 0.0), &targets, &mods())
            .expect("cast should succeed");
        assert_eq!(outcome.hits.len(), 1);
        assert_eq!(outcome.hits[0].target, TargetRef::Opponent(9));
    }

    #[test]
    fn when_nova_is_cast_then_it_needs_no_aim_and_hits_around_the_caster() {
        let mut coord = AbilityCoordinator::new();
        coord.grant_upgrade_point();
        assert!(coord.apply_pick(AbilityKey::Nova));
        let slot = (0..SLOT_COUNT)
            .find(|s| coord.slot(*s) == Some(AbilityKey::Nova))
            .expect("nova should be auto-assigned");
        let targets = [opponent_at(50.0, 0.0), opponent_at(400.0, 0.0)];
        let outcome = coord
            .cast(slot, 0.0, 0.0, (0.0, 0.0), &targets, &mods())
            .expect("unaimed nova should cast");
        assert_eq!(outcome.hits.len(), 1);
    }

    #[test]
    fn when_a_zone_is_cast_then_no_immediate_hits_are_produced() {
        let mut coord = AbilityCoordinator::new();
        coord.grant_upgrade_point();
        assert!(coord.apply_pick(AbilityKey::Zone));
        let slot = (0..SLOT_COUNT)
            .find(|s| coord.slot(*s) == Some(AbilityKey::Zone))
            .unwrap();
        let targets = [opponent_at(200.0, 0.0)];
        let outcome = coord
            .cast(slot, 1.0, 0.0, (0.0, 0.0), &targets, &mods())
            .expect("zone cast should succeed");
        assert!(outcome.hits.is_empty());
        assert!(AbilityKey::Zone.spec().is_persistent());
    }

    #[test]
    fn when_a_pick_is_pending_then_a_second_proposal_is_rejected() {
        let mut coord = AbilityCoordinator::new();
        coord.grant_upgrade_point();
        coord.grant_upgrade_point();
        assert!(coord.propose_pick(AbilityKey::Beam).is_some());
        assert!(coord.propose_pick(AbilityKey::Nova).is_none());
        assert!(coord.resolve_pick(AbilityKey::Beam, true));
        assert_eq!(coord.rank(AbilityKey::Beam), 1);
        assert_eq!(coord.upgrade_points(), 1);
        // Cleared: the next proposal may go out.
        assert!(coord.propose_pick(AbilityKey::Nova).is_some());
    }

    #[test]
    fn when_a_pick_is_rejected_then_the_rank_and_points_are_untouched() {
        let mut coord = AbilityCoordinator::new();
        coord.grant_upgrade_point();
        assert!(coord.propose_pick(AbilityKey::Beam).is_some());
        assert!(!coord.resolve_pick(AbilityKey::Beam, false));
        assert_eq!(coord.rank(AbilityKey::Beam), 0);
        assert_eq!(coord.upgrade_points(), 1);
        assert!(coord.pending_pick().is_none());
    }

    #[test]
    fn when_a_stale_pick_result_arrives_then_it_is_ignored() {
        let mut coord = AbilityCoordinator::new();
        assert!(!coord.resolve_pick(AbilityKey::Beam, true));
        assert_eq!(coord.rank(AbilityKey::Beam), 0);
    }
}
