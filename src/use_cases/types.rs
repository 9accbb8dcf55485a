// Use-case level events and commands crossing the network seam.
//
// Everything here is already sanitized by the protocol adapter: ids are
// numeric, coordinates are finite or absent.

use crate::domain::abilities::AbilityKey;
use crate::domain::state::{EndReason, EnemyKind, RemoteKind};
use uuid::Uuid;

pub use crate::domain::state::{MatchOutcome, MatchPhase};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Solo,
    Pvp,
    Coop,
}

impl MatchMode {
    pub fn networked(self) -> bool {
        !matches!(self, MatchMode::Solo)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MatchMode::Solo => "solo",
            MatchMode::Pvp => "pvp",
            MatchMode::Coop => "coop",
        }
    }
}

/// Phase transitions announced by the authority.
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseEvent {
    Waiting,
    Countdown {
        seconds: f32,
        start_position: Option<(f32, f32)>,
    },
    Running,
    Ended {
        winner_id: Option<u64>,
        reason: EndReason,
    },
}

/// One entity's state inside a snapshot. `None` fields were dropped by
/// sanitization or simply not transmitted; only present fields update.
#[derive(Debug, Clone)]
pub struct EntityState {
    pub id: u64,
    pub kind: RemoteKind,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub vx: Option<f32>,
    pub vy: Option<f32>,
    pub hp: Option<i32>,
    pub max_hp: Option<i32>,
    pub level: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct WorldSnapshot {
    pub server_time_ms: u64,
    pub entities: Vec<EntityState>,
}

/// Authoritative events flowing from the network adapter into the session.
#[derive(Debug, Clone)]
pub enum ServerEvent {
    Phase(PhaseEvent),
    Snapshot(WorldSnapshot),
    DamageConfirmed {
        target_id: u64,
        new_hp: i32,
        amount: i32,
        source_id: u64,
    },
    EnemySpawned {
        id: u64,
        kind: EnemyKind,
        x: f32,
        y: f32,
        vx: f32,
        vy: f32,
        hp: i32,
        max_hp: i32,
    },
    PickResolved {
        key: AbilityKey,
        accepted: bool,
    },
    PeerFx {
        key: AbilityKey,
        x: f32,
        y: f32,
        dir_x: f32,
        dir_y: f32,
        rank: u8,
    },
}

/// Commands the session queues for the network adapter to send.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCommand {
    Input {
        move_x: f32,
        move_y: f32,
        aim_x: f32,
        aim_y: f32,
    },
    DamageReport {
        hit_id: Uuid,
        target_id: u64,
        amount: i32,
        ability: Option<AbilityKey>,
    },
    SkillFx {
        key: AbilityKey,
        x: f32,
        y: f32,
        dir_x: f32,
        dir_y: f32,
        rank: u8,
    },
    PickRequest {
        key: AbilityKey,
    },
}
