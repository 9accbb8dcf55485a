// The match session: one explicit object owning every piece of reconciliation
// state for one match, constructed at scene entry and torn down at exit.
//
// Frame order is the correctness backbone: all queued authority events apply
// before movement/physics integration, so a frame's output always reflects
// the freshest authoritative data.

use crate::domain::abilities::{AbilityKey, BuildModifiers};
use crate::domain::ports::{HudTarget, Presentation, SoundCue};
use crate::domain::state::{
    ActiveZone, EndReason, EnemyKind, FrameInput, LocalHealth, MatchOutcome, MatchPhase,
    RemoteEntity, RemoteKind, SimEnemy, SimProjectile, TargetPoint, TargetRef,
};
use crate::domain::systems::{enemies, movement, projectiles};
use crate::domain::tuning::enemy::EnemyStats;
use crate::domain::tuning::player::xp_to_next_level;
use crate::domain::tuning::GameTuning;
use crate::use_cases::ability::AbilityCoordinator;
use crate::use_cases::damage::DamageRouter;
use crate::use_cases::director::StageDirector;
use crate::use_cases::phase::{PhaseChange, PhaseMachine};
use crate::use_cases::snapshot::{IngestOutcome, SnapshotBuffer};
use crate::use_cases::types::{
    ClientCommand, MatchMode, PhaseEvent, ServerEvent, WorldSnapshot,
};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info};

/// Countdown used when the session is its own authority (solo).
const SOLO_COUNTDOWN_SECONDS: f32 = 3.0;

pub struct SessionConfig {
    pub mode: MatchMode,
    pub self_id: u64,
    pub seed: u64,
    pub tuning: GameTuning,
}

pub struct MatchSession<P: Presentation> {
    mode: MatchMode,
    self_id: u64,
    tuning: GameTuning,
    presentation: P,

    phase: PhaseMachine,
    snapshots: SnapshotBuffer,
    router: DamageRouter,
    abilities: AbilityCoordinator,
    director: Option<StageDirector>,

    inbound: VecDeque<ServerEvent>,
    outbound: VecDeque<ClientCommand>,

    // Local player state.
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    hp: LocalHealth,
    max_hp: i32,
    level: u32,
    xp: i32,
    aim_x: f32,
    aim_y: f32,
    fire_cooldown: f32,

    enemies: Vec<SimEnemy>,
    projectiles: Vec<SimProjectile>,
    zones: Vec<ActiveZone>,
    next_local_id: u64,

    match_clock: f32,
    input_report_accum: f32,
    kills: u32,
    rng: SmallRng,
    closed: bool,
}

impl<P: Presentation> MatchSession<P> {
    pub fn new(cfg: SessionConfig, presentation: P) -> Self {
        let director = match cfg.mode {
            MatchMode::Solo => Some(StageDirector::new(cfg.seed, cfg.tuning.bounds)),
            _ => None,
        };
        let mut session = Self {
            mode: cfg.mode,
            self_id: cfg.self_id,
            presentation,
            phase: PhaseMachine::new(cfg.mode == MatchMode::Coop),
            snapshots: SnapshotBuffer::new(cfg.tuning.snapshot),
            router: DamageRouter::new(),
            abilities: AbilityCoordinator::new(),
            director,
            inbound: VecDeque::new(),
            outbound: VecDeque::new(),
            x: 0.0,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            hp: LocalHealth::new(cfg.tuning.player.max_hp),
            max_hp: cfg.tuning.player.max_hp,
            level: 1,
            xp: 0,
            aim_x: 0.0,
            aim_y: 0.0,
            fire_cooldown: 0.0,
            enemies: Vec::new(),
            projectiles: Vec::new(),
            zones: Vec::new(),
            next_local_id: 1,
            match_clock: 0.0,
            input_report_accum: 0.0,
            kills: 0,
            rng: SmallRng::seed_from_u64(cfg.seed),
            tuning: cfg.tuning,
            closed: false,
        };
        if cfg.mode == MatchMode::Solo {
            // The session is its own authority: arm the starting countdown
            // through the same event path networked modes use.
            session.inbound.push_back(ServerEvent::Phase(PhaseEvent::Countdown {
                seconds: SOLO_COUNTDOWN_SECONDS,
                start_position: None,
            }));
        }
        session
    }

    // Accessors used by the runner, the presentation layer and tests.

    pub fn phase(&self) -> MatchPhase {
        self.phase.phase()
    }

    pub fn outcome(&self) -> Option<MatchOutcome> {
        self.phase.outcome()
    }

    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    pub fn velocity(&self) -> (f32, f32) {
        (self.vx, self.vy)
    }

    /// Seconds since the match entered Running.
    pub fn match_clock(&self) -> f32 {
        self.match_clock
    }

    pub fn health(&self) -> (i32, i32) {
        (self.hp.get(), self.max_hp)
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn kills(&self) -> u32 {
        self.kills
    }

    pub fn stage(&self) -> Option<u32> {
        self.director.as_ref().map(|d| d.stage())
    }

    pub fn remote(&self, id: u64) -> Option<&RemoteEntity> {
        self.snapshots.get(id)
    }

    /// Live local enemies, for renderers polling per-frame positions.
    pub fn enemies(&self) -> &[SimEnemy] {
        &self.enemies
    }

    pub fn projectiles(&self) -> &[SimProjectile] {
        &self.projectiles
    }

    pub fn remotes(&self) -> impl Iterator<Item = &RemoteEntity> {
        self.snapshots.iter()
    }

    pub fn remote_count(&self) -> usize {
        self.snapshots.len()
    }

    pub fn enemy_count(&self) -> usize {
        self.enemies.len()
    }

    pub fn upgrade_points(&self) -> u32 {
        self.abilities.upgrade_points()
    }

    pub fn cooldown_remaining(&self, slot: usize) -> f32 {
        self.abilities.cooldown_remaining(slot)
    }

    /// Queues an authoritative event; it applies at the top of the next frame.
    pub fn enqueue(&mut self, event: ServerEvent) {
        self.inbound.push_back(event);
    }

    /// Drains the commands the network adapter should send.
    pub fn drain_outbound(&mut self) -> Vec<ClientCommand> {
        self.outbound.drain(..).collect()
    }

    /// One simulation/render tick. Queued authority events are always applied
    /// before any local simulation.
    pub fn frame(&mut self, dt: f32, input: &FrameInput) {
        while let Some(event) = self.inbound.pop_front() {
            self.apply_server_event(event);
        }

        if let Some(change) = self.phase.tick(dt) {
            self.on_phase_change(change);
        }

        if self.closed {
            return;
        }

        // Last-known aim survives frames with no aim input (stick aiming).
        if input.aim_x != 0.0 || input.aim_y != 0.0 {
            self.aim_x = input.aim_x;
            self.aim_y = input.aim_y;
        }

        if !self.phase.input_enabled() {
            self.vx = 0.0;
            self.vy = 0.0;
            return;
        }

        // Movement.
        let cfg = movement::MovementConfig {
            max_speed: self.tuning.player.max_speed,
            bounds: self.tuning.bounds,
        };
        let (vx, vy) = movement::tick_player(
            &mut self.x,
            &mut self.y,
            input.move_x,
            input.move_y,
            dt,
            cfg,
        );
        self.vx = vx;
        self.vy = vy;

        // Primary fire.
        self.fire_cooldown = (self.fire_cooldown - dt).max(0.0);
        let aim_mag = (self.aim_x * self.aim_x + self.aim_y * self.aim_y).sqrt();
        if input.fire && self.fire_cooldown <= 0.0 && aim_mag > 1e-3 {
            projectiles::spawn(
                &mut self.projectiles,
                &mut self.next_local_id,
                self.x,
                self.y,
                self.aim_x / aim_mag,
                self.aim_y / aim_mag,
                self.tuning.player.radius,
                self.tuning.projectile,
            );
            self.fire_cooldown = self.tuning.player.fire_cooldown;
            self.presentation.sound(SoundCue::Fire);
        }
        projectiles::integrate(&mut self.projectiles, dt, self.tuning.bounds);
        let targets = self.known_targets();
        let hits = projectiles::collide(
            &mut self.projectiles,
            &targets,
            self.tuning.projectile.radius,
        );
        let projectile_damage = self.tuning.projectile.damage;
        for hit in hits {
            self.route_hit(hit, projectile_damage, None);
        }

        // Persistent zones damage on their own tick.
        self.tick_zones(dt);

        // Solo wave direction and enemy simulation.
        if let Some(director) = self.director.as_mut() {
            let frame = director.tick(dt, self.x, self.y);
            if let Some(stage) = frame.advanced_to {
                self.presentation.stage_advanced(stage);
            }
            for order in frame.spawns {
                self.spawn_enemy(order.kind, order.x, order.y);
            }
        }
        enemies::tick_enemies(&mut self.enemies, self.x, self.y, dt, self.tuning.bounds);
        let contact = enemies::contact_damage(
            &mut self.enemies,
            self.x,
            self.y,
            self.tuning.player.radius,
        );
        if contact > 0 {
            let hp = self.hp.apply_damage(contact);
            self.presentation
                .health_changed(HudTarget::SelfPlayer, hp, self.max_hp);
            self.presentation.sound(SoundCue::Hurt);
            if self.hp.is_dead() && self.mode == MatchMode::Solo {
                self.local_end(None, EndReason::HpZero);
                return;
            }
        }

        // Reconcile remote entities toward the freshest authoritative data.
        self.snapshots.advance(dt);

        self.router.tick(dt);
        self.abilities.tick(dt);
        self.match_clock += dt;

        // Outbound input reports are throttled well below the frame rate.
        if self.mode.networked() {
            self.input_report_accum += dt;
            if self.input_report_accum >= self.tuning.input.report_interval {
                self.input_report_accum = 0.0;
                self.outbound.push_back(ClientCommand::Input {
                    move_x: input.move_x,
                    move_y: input.move_y,
                    aim_x: self.aim_x,
                    aim_y: self.aim_y,
                });
            }
        }
    }

    /// Presentation hook: cast the ability in `slot` toward `aim` (falling
    /// back to the last-known aim). Returns whether the cast happened.
    pub fn cast(&mut self, slot: usize, aim: Option<(f32, f32)>) -> bool {
        if self.closed || !self.phase.input_enabled() {
            debug!(slot, "cast rejected outside running phase");
            return false;
        }
        if let Some((x, y)) = aim {
            if x != 0.0 || y != 0.0 {
                self.aim_x = x;
                self.aim_y = y;
            }
        }
        let targets = self.known_targets();
        let mods = self.build_mods();
        let outcome = match self.abilities.cast(
            slot,
            self.aim_x,
            self.aim_y,
            (self.x, self.y),
            &targets,
            &mods,
        ) {
            Ok(outcome) => outcome,
            Err(err) => {
                debug!(slot, ?err, "cast rejected");
                return false;
            }
        };

        self.presentation.cooldown_started(slot, outcome.cooldown);
        self.presentation.skill_effect(
            outcome.key,
            self.x,
            self.y,
            outcome.dir_x,
            outcome.dir_y,
            outcome.rank,
        );
        self.presentation.sound(SoundCue::Cast);

        // Cosmetic broadcast only; the damage path stays separate.
        if self.mode.networked() {
            self.outbound.push_back(ClientCommand::SkillFx {
                key: outcome.key,
                x: self.x,
                y: self.y,
                dir_x: outcome.dir_x,
                dir_y: outcome.dir_y,
                rank: outcome.rank,
            });
        }

        match outcome.key {
            AbilityKey::Dash => {
                let (x, y) = self.tuning.bounds.clamp(
                    self.x + outcome.dir_x * outcome.range,
                    self.y + outcome.dir_y * outcome.range,
                );
                self.x = x;
                self.y = y;
            }
            AbilityKey::Zone => {
                self.zones.push(ActiveZone {
                    key: outcome.key,
                    rank: outcome.rank,
                    x: self.x + outcome.dir_x * outcome.range,
                    y: self.y + outcome.dir_y * outcome.range,
                    radius: outcome.radius,
                    remaining: outcome.key.spec().duration,
                    tick_accum: 0.0,
                });
            }
            _ => {}
        }

        let raw = outcome.raw_damage;
        let key = outcome.key;
        for hit in outcome.hits {
            self.route_hit(hit.target, raw, Some(key));
        }
        true
    }

    /// Presentation hook: spend an upgrade point on `key`. Solo applies
    /// immediately; networked modes propose and await the authority.
    pub fn choose_upgrade(&mut self, key: AbilityKey) -> bool {
        if self.closed || self.phase.phase() == MatchPhase::Ended {
            return false;
        }
        if self.mode.networked() {
            match self.abilities.propose_pick(key) {
                Some(command) => {
                    self.outbound.push_back(command);
                    true
                }
                None => false,
            }
        } else {
            let applied = self.abilities.apply_pick(key);
            if applied {
                self.presentation.upgrade_ready(self.abilities.upgrade_points());
            }
            applied
        }
    }

    /// The connection dropped: the match is over from this client's view.
    pub fn connection_lost(&mut self) {
        if let Some(change) = self.phase.force_end(MatchOutcome {
            winner_id: None,
            reason: EndReason::Disconnect,
        }) {
            self.on_phase_change(change);
        }
    }

    /// Scene exit: clears every map so nothing dangles after teardown.
    pub fn close(&mut self) {
        self.closed = true;
        self.snapshots.clear();
        self.enemies.clear();
        self.projectiles.clear();
        self.zones.clear();
        self.inbound.clear();
        self.outbound.clear();
    }

    fn apply_server_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::Phase(phase_event) => {
                if let Some(change) = self.phase.apply_authority(&phase_event) {
                    self.on_phase_change(change);
                }
            }
            ServerEvent::Snapshot(snapshot) => self.apply_snapshot(snapshot),
            ServerEvent::DamageConfirmed {
                target_id,
                new_hp,
                amount,
                source_id,
            } => self.apply_damage_confirmation(target_id, new_hp, amount, source_id),
            ServerEvent::EnemySpawned {
                id,
                kind,
                x,
                y,
                vx,
                vy,
                hp,
                max_hp,
            } => {
                let stats = EnemyStats::for_kind(kind, 1);
                self.snapshots
                    .insert_spawned(id, RemoteKind::Enemy, x, y, vx, vy, hp, max_hp, stats.radius);
                self.presentation.enemy_spawned(id, kind, x, y);
            }
            ServerEvent::PickResolved { key, accepted } => {
                if self.abilities.resolve_pick(key, accepted) {
                    self.presentation.upgrade_ready(self.abilities.upgrade_points());
                    self.presentation.sound(SoundCue::LevelUp);
                }
            }
            ServerEvent::PeerFx {
                key,
                x,
                y,
                dir_x,
                dir_y,
                rank,
            } => {
                // Cosmetic replication only; never touches game state.
                self.presentation.skill_effect(key, x, y, dir_x, dir_y, rank);
            }
        }
    }

    fn apply_snapshot(&mut self, snapshot: WorldSnapshot) {
        let mut seen: HashSet<u64> = HashSet::with_capacity(snapshot.entities.len());
        for entity in &snapshot.entities {
            if entity.id == self.self_id {
                // Own health is authority-sourced in networked modes; our
                // position stays locally predicted.
                if let Some(hp) = entity.hp {
                    self.hp = LocalHealth::new(hp);
                    self.presentation
                        .health_changed(HudTarget::SelfPlayer, hp, self.max_hp);
                }
                continue;
            }
            seen.insert(entity.id);
            let radius = match entity.kind {
                RemoteKind::Opponent => self.tuning.player.radius,
                RemoteKind::Enemy => 12.0,
            };
            let outcome = self
                .snapshots
                .ingest(entity, radius, snapshot.server_time_ms);
            if outcome == IngestOutcome::Created {
                let (x, y) = (entity.x.unwrap_or(0.0), entity.y.unwrap_or(0.0));
                match entity.kind {
                    RemoteKind::Opponent => self.presentation.opponent_spawned(entity.id, x, y),
                    RemoteKind::Enemy => {
                        self.presentation
                            .enemy_spawned(entity.id, EnemyKind::Grunt, x, y)
                    }
                }
            }
        }
        for id in self.snapshots.retain_reported(&seen) {
            self.presentation.entity_despawned(id);
        }
    }

    fn apply_damage_confirmation(&mut self, target_id: u64, new_hp: i32, amount: i32, source_id: u64) {
        if target_id == self.self_id {
            self.hp = LocalHealth::new(new_hp);
            self.presentation
                .health_changed(HudTarget::SelfPlayer, new_hp, self.max_hp);
            return;
        }
        let Some(confirmed) = self.snapshots.set_health_from_authority(target_id, new_hp) else {
            // Stale reference: the entity is gone, the confirmation is a no-op.
            debug!(target_id, "damage confirmation for untracked entity");
            return;
        };
        let hud = match confirmed.kind {
            RemoteKind::Opponent => HudTarget::Opponent(target_id),
            RemoteKind::Enemy => HudTarget::Enemy(target_id),
        };
        self.presentation
            .damage_number(confirmed.x, confirmed.y, amount, false);
        self.presentation
            .health_changed(hud, confirmed.new_hp, confirmed.max_hp);
        if confirmed.dead {
            self.snapshots.remove(target_id);
            self.presentation.entity_despawned(target_id);
            if source_id == self.self_id {
                self.presentation.sound(SoundCue::Kill);
                self.kills += 1;
                self.grant_xp(4);
            }
        }
    }

    fn on_phase_change(&mut self, change: PhaseChange) {
        match change {
            PhaseChange::EnterWaiting => {
                self.vx = 0.0;
                self.vy = 0.0;
                self.presentation.phase_changed(MatchPhase::Waiting);
            }
            PhaseChange::EnterCountdown {
                seconds,
                start_position,
            } => {
                if let Some((x, y)) = start_position {
                    self.x = x;
                    self.y = y;
                }
                self.vx = 0.0;
                self.vy = 0.0;
                self.presentation.phase_changed(MatchPhase::Countdown);
                self.presentation.countdown_started(seconds);
            }
            PhaseChange::EnterRunning => {
                // Stale pre-match timers must not leak into the match.
                self.fire_cooldown = 0.0;
                self.match_clock = 0.0;
                self.input_report_accum = 0.0;
                self.presentation.phase_changed(MatchPhase::Running);
            }
            PhaseChange::Ended(outcome) => {
                self.vx = 0.0;
                self.vy = 0.0;
                let won = outcome.winner_id == Some(self.self_id);
                info!(?outcome, won, "match ended");
                self.presentation.phase_changed(MatchPhase::Ended);
                self.presentation.match_ended(outcome, won);
                self.presentation.sound(if won {
                    SoundCue::Victory
                } else {
                    SoundCue::Defeat
                });
            }
        }
    }

    fn local_end(&mut self, winner_id: Option<u64>, reason: EndReason) {
        if let Some(change) = self
            .phase
            .apply_authority(&PhaseEvent::Ended { winner_id, reason })
        {
            self.on_phase_change(change);
        }
    }

    fn build_mods(&self) -> BuildModifiers {
        BuildModifiers::from_ranks(self.abilities.ranks(), &self.tuning.combat)
    }

    /// Everything a cast or projectile can currently hit: local enemies plus
    /// remote entities at their extrapolated render positions.
    fn known_targets(&self) -> Vec<TargetPoint> {
        let mut targets: Vec<TargetPoint> = self
            .enemies
            .iter()
            .map(|e| TargetPoint {
                target: TargetRef::LocalEnemy(e.id),
                x: e.x,
                y: e.y,
                radius: e.radius,
            })
            .collect();
        targets.extend(self.snapshots.iter().map(|e| TargetPoint {
            target: match e.kind {
                RemoteKind::Opponent => TargetRef::Opponent(e.id),
                RemoteKind::Enemy => TargetRef::NetworkedEnemy(e.id),
            },
            x: e.render_x,
            y: e.render_y,
            radius: e.radius,
        }));
        targets
    }

    /// The single entry point for every damage-causing event.
    fn route_hit(&mut self, target: TargetRef, raw: f32, ability: Option<AbilityKey>) {
        let mods = self.build_mods();
        match target {
            TargetRef::LocalEnemy(id) => {
                let Some(index) = self.enemies.iter().position(|e| e.id == id) else {
                    return;
                };
                let hit = self.router.hit_local(
                    &mut self.enemies[index],
                    raw,
                    &mods,
                    &mut self.rng,
                    &mut self.presentation,
                );
                self.presentation.sound(SoundCue::Hit);
                if hit.killed {
                    self.on_enemy_killed(index);
                }
            }
            TargetRef::NetworkedEnemy(_) | TargetRef::Opponent(_) => {
                let Some(remote) = self.snapshots.get(target.id()) else {
                    return;
                };
                let (x, y) = (remote.render_x, remote.render_y);
                self.router.hit_networked(
                    target,
                    x,
                    y,
                    raw,
                    ability,
                    &mods,
                    &mut self.rng,
                    &mut self.presentation,
                    &mut self.outbound,
                );
            }
        }
    }

    fn tick_zones(&mut self, dt: f32) {
        let mut due: Vec<(f32, f32, f32, f32, AbilityKey)> = Vec::new();
        for zone in &mut self.zones {
            zone.remaining -= dt;
            zone.tick_accum -= dt;
            if zone.remaining > 0.0 && zone.tick_accum <= 0.0 {
                let spec = zone.key.spec();
                zone.tick_accum = spec.tick_interval;
                due.push((
                    zone.x,
                    zone.y,
                    zone.radius,
                    spec.damage_for(zone.rank),
                    zone.key,
                ));
            }
        }
        self.zones.retain(|z| z.remaining > 0.0);

        for (zx, zy, radius, raw, key) in due {
            let hits: Vec<TargetRef> = self
                .known_targets()
                .into_iter()
                .filter(|t| {
                    crate::domain::systems::combat::circles_overlap(
                        zx, zy, radius, t.x, t.y, t.radius,
                    )
                })
                .map(|t| t.target)
                .collect();
            for target in hits {
                self.route_hit(target, raw, Some(key));
            }
        }
    }

    fn spawn_enemy(&mut self, kind: EnemyKind, x: f32, y: f32) {
        let stage = self.director.as_ref().map(|d| d.stage()).unwrap_or(1);
        let stats = EnemyStats::for_kind(kind, stage);
        let id = self.next_local_id;
        self.next_local_id = self.next_local_id.wrapping_add(1);
        self.enemies.push(SimEnemy {
            id,
            kind,
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            radius: stats.radius,
            speed: stats.speed,
            hp: LocalHealth::new(stats.hp),
            max_hp: stats.hp,
            contact_damage: stats.contact_damage,
            contact_cooldown: 0.0,
            xp_reward: stats.xp_reward,
        });
        self.presentation.enemy_spawned(id, kind, x, y);
    }

    fn on_enemy_killed(&mut self, index: usize) {
        let enemy = self.enemies.swap_remove(index);
        self.kills += 1;
        self.presentation.entity_despawned(enemy.id);
        self.presentation.sound(SoundCue::Kill);
        self.grant_xp(enemy.xp_reward);
        if let Some(director) = self.director.as_mut() {
            let was_boss = enemy.kind == EnemyKind::Boss;
            if director.record_kill(was_boss) {
                self.presentation.sound(SoundCue::StageClear);
            }
        }
    }

    fn grant_xp(&mut self, amount: i32) {
        self.xp += amount;
        while self.xp >= xp_to_next_level(self.level) {
            self.xp -= xp_to_next_level(self.level);
            self.level += 1;
            self.abilities.grant_upgrade_point();
            self.presentation.sound(SoundCue::LevelUp);
            self.presentation.upgrade_ready(self.abilities.upgrade_points());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::types::EntityState;

    const DT: f32 = 1.0 / 60.0;
    const SELF_ID: u64 = 7;
    const OPPONENT_ID: u64 = 9;

    /// Presentation fake that records every call as a line for assertions.
    #[derive(Default)]
    struct RecordingPresentation {
        events: Vec<String>,
    }

    impl RecordingPresentation {
        fn count(&self, prefix: &str) -> usize {
            self.events.iter().filter(|e| e.starts_with(prefix)).count()
        }
    }

    impl Presentation for RecordingPresentation {
        fn enemy_spawned(&mut self, id: u64, kind: EnemyKind, x: f32, y: f32) {
            self.events.push(format!("enemy_spawned:{id}:{kind:?}:{x}:{y}"));
        }
        fn opponent_spawned(&mut self, id: u64, _x: f32, _y: f32) {
            self.events.push(format!("opponent_spawned:{id}"));
        }
        fn entity_despawned(&mut self, id: u64) {
            self.events.push(format!("despawned:{id}"));
        }
        fn damage_number(&mut self, _x: f32, _y: f32, amount: i32, crit: bool) {
            self.events.push(format!("damage_number:{amount}:{crit}"));
        }
        fn health_changed(&mut self, target: HudTarget, hp: i32, _max_hp: i32) {
            self.events.push(format!("health:{target:?}:{hp}"));
        }
        fn cooldown_started(&mut self, slot: usize, _seconds: f32) {
            self.events.push(format!("cooldown:{slot}"));
        }
        fn skill_effect(&mut self, key: AbilityKey, _x: f32, _y: f32, _dx: f32, _dy: f32, rank: u8) {
            self.events.push(format!("skill_fx:{key:?}:{rank}"));
        }
        fn countdown_started(&mut self, seconds: f32) {
            self.events.push(format!("countdown:{seconds}"));
        }
        fn phase_changed(&mut self, phase: MatchPhase) {
            self.events.push(format!("phase:{phase:?}"));
        }
        fn match_ended(&mut self, outcome: MatchOutcome, won: bool) {
            self.events.push(format!("ended:{:?}:{won}", outcome.reason));
        }
        fn stage_advanced(&mut self, stage: u32) {
            self.events.push(format!("stage:{stage}"));
        }
        fn upgrade_ready(&mut self, points: u32) {
            self.events.push(format!("upgrade_ready:{points}"));
        }
        fn sound(&mut self, cue: SoundCue) {
            self.events.push(format!("sound:{cue:?}"));
        }
    }

    fn session(mode: MatchMode) -> MatchSession<RecordingPresentation> {
        MatchSession::new(
            SessionConfig {
                mode,
                self_id: SELF_ID,
                seed: 42,
                tuning: GameTuning::default(),
            },
            RecordingPresentation::default(),
        )
    }

    fn start_running(session: &mut MatchSession<RecordingPresentation>) {
        session.enqueue(ServerEvent::Phase(PhaseEvent::Countdown {
            seconds: 0.5,
            start_position: None,
        }));
        session.enqueue(ServerEvent::Phase(PhaseEvent::Running));
        session.frame(DT, &FrameInput::default());
        assert_eq!(session.phase(), MatchPhase::Running);
    }

    fn opponent_state(x: f32, y: f32, hp: i32) -> EntityState {
        EntityState {
            id: OPPONENT_ID,
            kind: RemoteKind::Opponent,
            x: Some(x),
            y: Some(y),
            vx: Some(0.0),
            vy: Some(0.0),
            hp: Some(hp),
            max_hp: Some(100),
            level: Some(1),
        }
    }

    fn snapshot_with_opponent(ms: u64, x: f32, y: f32, hp: i32) -> ServerEvent {
        ServerEvent::Snapshot(WorldSnapshot {
            server_time_ms: ms,
            entities: vec![opponent_state(x, y, hp)],
        })
    }

    #[test]
    fn when_events_are_queued_then_they_apply_before_the_frames_simulation() {
        let mut s = session(MatchMode::Pvp);
        start_running(&mut s);
        s.enqueue(snapshot_with_opponent(1000, 100.0, 0.0, 100));
        assert_eq!(s.remote_count(), 0);
        s.frame(DT, &FrameInput::default());
        assert_eq!(s.remote_count(), 1);
        assert_eq!(s.presentation.count("opponent_spawned"), 1);
    }

    #[test]
    fn when_a_networked_target_is_attacked_then_its_health_waits_for_the_authority() {
        let mut s = session(MatchMode::Pvp);
        start_running(&mut s);
        s.enqueue(snapshot_with_opponent(1000, 100.0, 0.0, 100));
        s.frame(DT, &FrameInput::default());

        // Hammer the opponent with casts across several seconds of frames.
        let mut reports = 0;
        for _ in 0..600 {
            s.cast(0, Some((1.0, 0.0)));
            s.frame(DT, &FrameInput::default());
            for command in s.drain_outbound() {
                if matches!(command, ClientCommand::DamageReport { .. }) {
                    reports += 1;
                }
            }
            // The invariant under fuzz: local code never moves this number.
            assert_eq!(s.remote(OPPONENT_ID).unwrap().hp.get(), 100);
        }
        assert!(reports > 0, "casts should have produced damage reports");

        // Only the authority's confirmation moves it.
        s.enqueue(ServerEvent::DamageConfirmed {
            target_id: OPPONENT_ID,
            new_hp: 88,
            amount: 12,
            source_id: SELF_ID,
        });
        s.frame(DT, &FrameInput::default());
        assert_eq!(s.remote(OPPONENT_ID).unwrap().hp.get(), 88);
    }

    #[test]
    fn when_the_match_is_not_running_then_casts_are_rejected() {
        let mut s = session(MatchMode::Pvp);
        s.enqueue(ServerEvent::Phase(PhaseEvent::Countdown {
            seconds: 10.0,
            start_position: None,
        }));
        s.frame(DT, &FrameInput::default());
        assert_eq!(s.phase(), MatchPhase::Countdown);
        assert!(!s.cast(0, Some((1.0, 0.0))));
        assert!(s.drain_outbound().is_empty());
        assert_eq!(s.presentation.count("skill_fx"), 0);
    }

    #[test]
    fn when_the_authority_ends_the_match_then_input_is_dead_afterwards() {
        let mut s = session(MatchMode::Pvp);
        start_running(&mut s);
        s.enqueue(ServerEvent::Phase(PhaseEvent::Ended {
            winner_id: Some(SELF_ID),
            reason: EndReason::HpZero,
        }));
        s.frame(DT, &FrameInput::default());
        assert_eq!(s.phase(), MatchPhase::Ended);
        assert_eq!(s.presentation.count("ended:HpZero:true"), 1);

        // Scenario C: no further input is accepted.
        assert!(!s.cast(0, Some((1.0, 0.0))));
        let before = s.position();
        let moving = FrameInput {
            move_x: 1.0,
            ..FrameInput::default()
        };
        s.frame(DT, &moving);
        assert_eq!(s.position(), before);
    }

    #[test]
    fn when_the_countdown_carries_start_coordinates_then_the_player_is_placed() {
        let mut s = session(MatchMode::Pvp);
        s.enqueue(ServerEvent::Phase(PhaseEvent::Countdown {
            seconds: 1.0,
            start_position: Some((-200.0, 50.0)),
        }));
        s.frame(DT, &FrameInput::default());
        assert_eq!(s.position(), (-200.0, 50.0));
        // Input is locked while counting down.
        let moving = FrameInput {
            move_x: 1.0,
            ..FrameInput::default()
        };
        s.frame(DT, &moving);
        assert_eq!(s.position(), (-200.0, 50.0));
    }

    #[test]
    fn when_an_entity_vanishes_from_the_snapshot_then_it_despawns_exactly_once() {
        let mut s = session(MatchMode::Coop);
        start_running(&mut s);
        s.enqueue(snapshot_with_opponent(1000, 100.0, 0.0, 100));
        s.frame(DT, &FrameInput::default());
        assert_eq!(s.remote_count(), 1);

        // Frame N+1 without the entity tears it down.
        s.enqueue(ServerEvent::Snapshot(WorldSnapshot {
            server_time_ms: 1100,
            entities: Vec::new(),
        }));
        s.frame(DT, &FrameInput::default());
        assert_eq!(s.remote_count(), 0);
        s.enqueue(ServerEvent::Snapshot(WorldSnapshot {
            server_time_ms: 1200,
            entities: Vec::new(),
        }));
        s.frame(DT, &FrameInput::default());
        assert_eq!(s.presentation.count(&format!("despawned:{OPPONENT_ID}")), 1);
    }

    #[test]
    fn when_a_confirmation_references_a_stale_entity_then_nothing_happens() {
        let mut s = session(MatchMode::Pvp);
        start_running(&mut s);
        s.enqueue(ServerEvent::DamageConfirmed {
            target_id: 4242,
            new_hp: 1,
            amount: 5,
            source_id: SELF_ID,
        });
        s.frame(DT, &FrameInput::default());
        assert_eq!(s.remote_count(), 0);
        assert_eq!(s.presentation.count("damage_number"), 0);
    }

    #[test]
    fn when_running_then_input_reports_flow_at_the_throttled_rate() {
        let mut s = session(MatchMode::Pvp);
        start_running(&mut s);
        s.drain_outbound();
        let moving = FrameInput {
            move_x: 1.0,
            aim_x: 1.0,
            ..FrameInput::default()
        };
        for _ in 0..60 {
            s.frame(DT, &moving);
        }
        let inputs = s
            .drain_outbound()
            .into_iter()
            .filter(|c| matches!(c, ClientCommand::Input { .. }))
            .count();
        // ~20 Hz from 60 frames of a 60 Hz loop.
        assert!((15..=22).contains(&inputs), "inputs = {inputs}");
    }

    #[test]
    fn when_peer_fx_arrives_then_it_is_cosmetic_only() {
        let mut s = session(MatchMode::Pvp);
        start_running(&mut s);
        s.enqueue(ServerEvent::PeerFx {
            key: AbilityKey::Nova,
            x: 10.0,
            y: 10.0,
            dir_x: 0.0,
            dir_y: 0.0,
            rank: 3,
        });
        s.frame(DT, &FrameInput::default());
        assert_eq!(s.presentation.count("skill_fx:Nova:3"), 1);
        assert_eq!(s.remote_count(), 0);
        assert_eq!(s.health(), (100, 100));
        assert!(s.drain_outbound().is_empty());
    }

    #[test]
    fn when_confirmed_kills_level_the_player_then_picks_negotiate_with_the_authority() {
        let mut s = session(MatchMode::Pvp);
        start_running(&mut s);
        s.enqueue(snapshot_with_opponent(1000, 100.0, 0.0, 100));
        s.enqueue(ServerEvent::EnemySpawned {
            id: 31,
            kind: EnemyKind::Grunt,
            x: 50.0,
            y: 50.0,
            vx: 0.0,
            vy: 0.0,
            hp: 10,
            max_hp: 10,
        });
        s.enqueue(ServerEvent::EnemySpawned {
            id: 32,
            kind: EnemyKind::Grunt,
            x: -50.0,
            y: 50.0,
            vx: 0.0,
            vy: 0.0,
            hp: 10,
            max_hp: 10,
        });
        s.frame(DT, &FrameInput::default());
        assert_eq!(s.remote_count(), 3);

        // Two confirmed kills reach the first level-up threshold.
        for id in [31u64, 32u64] {
            s.enqueue(ServerEvent::DamageConfirmed {
                target_id: id,
                new_hp: 0,
                amount: 10,
                source_id: SELF_ID,
            });
        }
        s.frame(DT, &FrameInput::default());
        assert_eq!(s.kills(), 2);
        assert_eq!(s.upgrade_points(), 1);
        assert_eq!(s.remote_count(), 1);

        // Propose; a second proposal while pending is refused.
        assert!(s.choose_upgrade(AbilityKey::Beam));
        assert!(!s.choose_upgrade(AbilityKey::Nova));
        let picks = s
            .drain_outbound()
            .into_iter()
            .filter(|c| matches!(c, ClientCommand::PickRequest { .. }))
            .count();
        assert_eq!(picks, 1);

        s.enqueue(ServerEvent::PickResolved {
            key: AbilityKey::Beam,
            accepted: true,
        });
        s.frame(DT, &FrameInput::default());
        assert_eq!(s.upgrade_points(), 0);
        assert!(s.presentation.count("sound:LevelUp") >= 1);
    }

    #[test]
    fn when_a_solo_run_starts_then_the_director_spawns_waves_after_the_countdown() {
        let mut s = session(MatchMode::Solo);
        assert_eq!(s.phase(), MatchPhase::Waiting);
        // Countdown armed by the session itself; let it elapse.
        for _ in 0..400 {
            s.frame(DT, &FrameInput::default());
            if s.phase() == MatchPhase::Running && s.enemy_count() > 0 {
                break;
            }
        }
        assert_eq!(s.phase(), MatchPhase::Running);
        assert!(s.enemy_count() > 0, "director should have spawned a wave");
        assert!(s.presentation.count("enemy_spawned") > 0);
        // No network: nothing should be queued outbound in solo.
        assert!(s.drain_outbound().is_empty());
    }

    #[test]
    fn when_an_idle_solo_player_is_overrun_then_the_match_ends_in_hp_zero() {
        let mut s = session(MatchMode::Solo);
        for _ in 0..3000 {
            s.frame(DT, &FrameInput::default());
            if s.phase() == MatchPhase::Ended {
                break;
            }
        }
        assert_eq!(s.phase(), MatchPhase::Ended);
        let outcome = s.outcome().expect("outcome set");
        assert_eq!(outcome.reason, EndReason::HpZero);
        assert_eq!(outcome.winner_id, None);
    }

    #[test]
    fn when_a_solo_cast_kills_an_enemy_then_the_kill_flow_runs_synchronously() {
        let mut s = session(MatchMode::Solo);
        // Reach running and wait for a wave.
        for _ in 0..400 {
            s.frame(DT, &FrameInput::default());
            if s.phase() == MatchPhase::Running && s.enemy_count() > 0 {
                break;
            }
        }
        assert!(s.enemy_count() > 0);

        // Keep casting at the nearest enemy until something dies.
        let mut killed = false;
        for _ in 0..900 {
            if s.phase() == MatchPhase::Ended {
                break;
            }
            if let Some(enemy) = s.enemies().first() {
                let (px, py) = s.position();
                let aim = (enemy.x - px, enemy.y - py);
                s.cast(0, Some(aim));
            }
            s.frame(DT, &FrameInput::default());
            if s.kills() > 0 {
                killed = true;
                break;
            }
        }
        assert!(killed, "a bolt-range enemy should have died");
        assert!(s.presentation.count("despawned:") > 0);
        assert!(s.presentation.count("sound:Kill") > 0);
    }

    #[test]
    fn when_the_connection_drops_then_the_match_ends_locally() {
        let mut s = session(MatchMode::Pvp);
        start_running(&mut s);
        s.connection_lost();
        assert_eq!(s.phase(), MatchPhase::Ended);
        assert_eq!(s.outcome().unwrap().reason, EndReason::Disconnect);
    }

    #[test]
    fn when_the_session_closes_then_every_map_is_cleared() {
        let mut s = session(MatchMode::Coop);
        start_running(&mut s);
        s.enqueue(snapshot_with_opponent(1000, 100.0, 0.0, 100));
        s.frame(DT, &FrameInput::default());
        assert_eq!(s.remote_count(), 1);
        s.close();
        assert_eq!(s.remote_count(), 0);
        assert_eq!(s.enemy_count(), 0);
        assert!(s.drain_outbound().is_empty());
        // A closed session simulates nothing further.
        s.frame(DT, &FrameInput::default());
        assert_eq!(s.remote_count(), 0);
    }
}
