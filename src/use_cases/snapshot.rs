// Snapshot buffer: authoritative state in, smooth render positions out.
//
// Remote entities advance by dead reckoning every frame and are pulled toward
// the extrapolated authoritative position; small errors blend, large errors
// snap (teleports, dashes, packet loss must not rubber-band across the arena).

use crate::domain::state::{AuthoritativeHealth, RemoteEntity, RemoteKind};
use crate::domain::tuning::snapshot::SnapshotTuning;
use crate::use_cases::types::EntityState;
use std::collections::{HashMap, HashSet};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Created,
    Updated,
    /// Stale or unusable sighting; nothing changed.
    Ignored,
}

/// Result of an authoritative health write, for HUD/feedback routing.
#[derive(Debug, Clone, Copy)]
pub struct ConfirmedHit {
    pub kind: RemoteKind,
    pub x: f32,
    pub y: f32,
    pub new_hp: i32,
    pub max_hp: i32,
    pub dead: bool,
}

pub struct SnapshotBuffer {
    tuning: SnapshotTuning,
    entities: HashMap<u64, RemoteEntity>,
}

impl SnapshotBuffer {
    pub fn new(tuning: SnapshotTuning) -> Self {
        Self {
            tuning,
            entities: HashMap::new(),
        }
    }

    pub fn get(&self, id: u64) -> Option<&RemoteEntity> {
        self.entities.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RemoteEntity> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Applies one authoritative sighting. Re-ingesting the same timestamp is
    /// a no-op; fields the sanitizer dropped leave their counterparts as-is.
    pub fn ingest(&mut self, state: &EntityState, radius: f32, server_time_ms: u64) -> IngestOutcome {
        let snap = self.tuning.snap_distance;
        if let Some(e) = self.entities.get_mut(&state.id) {
            if server_time_ms <= e.last_server_ms {
                return IngestOutcome::Ignored;
            }
            let elapsed = (server_time_ms - e.last_server_ms) as f32 / 1000.0;

            if let (Some(x), Some(y)) = (state.x, state.y) {
                match (state.vx, state.vy) {
                    (Some(vx), Some(vy)) => {
                        e.vx = vx;
                        e.vy = vy;
                    }
                    // Velocity not transmitted: derive it from consecutive
                    // authoritative positions. Deltas shorter than 10ms are
                    // too noisy to divide by; a jump past the snap threshold
                    // is a teleport, not motion.
                    _ if elapsed >= 0.01 => {
                        let dx = x - e.server_x;
                        let dy = y - e.server_y;
                        if dx * dx + dy * dy > snap * snap {
                            e.vx = 0.0;
                            e.vy = 0.0;
                        } else {
                            e.vx = dx / elapsed;
                            e.vy = dy / elapsed;
                        }
                    }
                    _ => {}
                }
                e.server_x = x;
                e.server_y = y;
            } else {
                if let Some(x) = state.x {
                    e.server_x = x;
                }
                if let Some(y) = state.y {
                    e.server_y = y;
                }
                if let Some(vx) = state.vx {
                    e.vx = vx;
                }
                if let Some(vy) = state.vy {
                    e.vy = vy;
                }
            }

            if let Some(hp) = state.hp {
                e.hp.set_from_authority(hp);
            }
            if let Some(max_hp) = state.max_hp {
                e.max_hp = max_hp;
            }
            if let Some(level) = state.level {
                e.level = level;
            }
            e.last_server_ms = server_time_ms;
            e.age = 0.0;
            IngestOutcome::Updated
        } else {
            // A first sighting with no usable position cannot be placed.
            let (Some(x), Some(y)) = (state.x, state.y) else {
                debug!(id = state.id, "dropping first sighting without position");
                return IngestOutcome::Ignored;
            };
            let max_hp = state.max_hp.or(state.hp).unwrap_or(1);
            self.entities.insert(
                state.id,
                RemoteEntity {
                    id: state.id,
                    kind: state.kind,
                    server_x: x,
                    server_y: y,
                    vx: state.vx.unwrap_or(0.0),
                    vy: state.vy.unwrap_or(0.0),
                    render_x: x,
                    render_y: y,
                    radius,
                    age: 0.0,
                    last_server_ms: server_time_ms,
                    hp: AuthoritativeHealth::new(state.hp.unwrap_or(max_hp)),
                    max_hp,
                    level: state.level.unwrap_or(1),
                },
            );
            IngestOutcome::Created
        }
    }

    /// Registers a server-simulated entity announced by a spawn message.
    #[allow(clippy::too_many_arguments)]
    pub fn insert_spawned(
        &mut self,
        id: u64,
        kind: RemoteKind,
        x: f32,
        y: f32,
        vx: f32,
        vy: f32,
        hp: i32,
        max_hp: i32,
        radius: f32,
    ) {
        self.entities.entry(id).or_insert(RemoteEntity {
            id,
            kind,
            server_x: x,
            server_y: y,
            vx,
            vy,
            render_x: x,
            render_y: y,
            radius,
            age: 0.0,
            last_server_ms: 0,
            hp: AuthoritativeHealth::new(hp),
            max_hp,
            level: 1,
        });
    }

    /// Advances every entity one render frame: extrapolate, then reconcile.
    pub fn advance(&mut self, dt: f32) {
        for e in self.entities.values_mut() {
            e.age += dt;
            e.render_x += e.vx * dt;
            e.render_y += e.vy * dt;

            // Where the authority's last report says the entity is by now.
            let target_x = e.server_x + e.vx * e.age;
            let target_y = e.server_y + e.vy * e.age;
            let dx = target_x - e.render_x;
            let dy = target_y - e.render_y;
            let err_sq = dx * dx + dy * dy;
            let snap = self.tuning.snap_distance;
            if err_sq > snap * snap {
                e.render_x = target_x;
                e.render_y = target_y;
            } else {
                let k = 1.0 - (-self.tuning.smoothing_rate * dt).exp();
                e.render_x += dx * k;
                e.render_y += dy * k;
            }
        }
    }

    /// Writes an authoritative health value. Returns None for untracked ids
    /// (a stale confirmation is a no-op).
    pub fn set_health_from_authority(&mut self, id: u64, hp: i32) -> Option<ConfirmedHit> {
        let e = self.entities.get_mut(&id)?;
        e.hp.set_from_authority(hp);
        Some(ConfirmedHit {
            kind: e.kind,
            x: e.render_x,
            y: e.render_y,
            new_hp: hp,
            max_hp: e.max_hp,
            dead: e.hp.is_dead(),
        })
    }

    /// Tears down entities absent from the newest snapshot's id set and
    /// returns the removed ids, each exactly once.
    pub fn retain_reported(&mut self, seen: &HashSet<u64>) -> Vec<u64> {
        let mut removed = Vec::new();
        self.entities.retain(|id, _| {
            if seen.contains(id) {
                true
            } else {
                removed.push(*id);
                false
            }
        });
        removed
    }

    pub fn remove(&mut self, id: u64) -> bool {
        self.entities.remove(&id).is_some()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }
}
