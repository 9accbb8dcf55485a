// Domain-level simulation entities and input/snapshot types.

use serde::{Deserialize, Serialize};

/// Health owned by the local simulation. Freely mutated by the damage router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalHealth(i32);

impl LocalHealth {
    pub fn new(hp: i32) -> Self {
        Self(hp.max(0))
    }

    pub fn get(self) -> i32 {
        self.0
    }

    pub fn is_dead(self) -> bool {
        self.0 <= 0
    }

    /// Applies damage (negative amounts are ignored) and returns the new value.
    pub fn apply_damage(&mut self, amount: i32) -> i32 {
        self.0 = (self.0 - amount.max(0)).max(0);
        self.0
    }
}

/// Health mirrored from the authority. The only writer is message ingestion,
/// so a networked entity's health cannot be decremented locally by mistake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthoritativeHealth(i32);

impl AuthoritativeHealth {
    pub fn new(hp: i32) -> Self {
        Self(hp)
    }

    pub fn get(self) -> i32 {
        self.0
    }

    pub fn is_dead(self) -> bool {
        self.0 <= 0
    }

    pub fn set_from_authority(&mut self, hp: i32) {
        self.0 = hp;
    }
}

/// Per-frame input handed to the session by the host (pointer, touch or stick).
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameInput {
    pub move_x: f32,
    pub move_y: f32,
    pub aim_x: f32,
    pub aim_y: f32,
    pub fire: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    Grunt,
    Runner,
    Tank,
    Boss,
}

/// An enemy fully owned by the local simulation (non-networked modes).
#[derive(Debug, Clone)]
pub struct SimEnemy {
    pub id: u64,
    pub kind: EnemyKind,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub radius: f32,
    pub speed: f32,
    pub hp: LocalHealth,
    pub max_hp: i32,
    pub contact_damage: i32,
    pub contact_cooldown: f32,
    pub xp_reward: i32,
}

/// A primary-fire projectile owned by the local simulation.
#[derive(Debug, Clone)]
pub struct SimProjectile {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub ttl: f32,
}

/// A persistent area effect placed by a cast (damage applied on its own tick).
#[derive(Debug, Clone)]
pub struct ActiveZone {
    pub key: crate::domain::abilities::AbilityKey,
    pub rank: u8,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub remaining: f32,
    pub tick_accum: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteKind {
    Opponent,
    Enemy,
}

/// An entity the authority owns: position is extrapolated between snapshots,
/// health only ever comes from the authority.
#[derive(Debug, Clone)]
pub struct RemoteEntity {
    pub id: u64,
    pub kind: RemoteKind,
    pub server_x: f32,
    pub server_y: f32,
    pub vx: f32,
    pub vy: f32,
    pub render_x: f32,
    pub render_y: f32,
    pub radius: f32,
    // Seconds since the last authoritative update, advanced per frame.
    pub age: f32,
    pub last_server_ms: u64,
    pub hp: AuthoritativeHealth,
    pub max_hp: i32,
    pub level: u32,
}

/// What a damage-causing effect struck, from the arbitration router's view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetRef {
    LocalEnemy(u64),
    NetworkedEnemy(u64),
    Opponent(u64),
}

impl TargetRef {
    pub fn id(self) -> u64 {
        match self {
            TargetRef::LocalEnemy(id) | TargetRef::NetworkedEnemy(id) | TargetRef::Opponent(id) => {
                id
            }
        }
    }

    pub fn is_networked(self) -> bool {
        !matches!(self, TargetRef::LocalEnemy(_))
    }
}

/// A hit-testable target: identity plus the position the player currently sees.
#[derive(Debug, Clone, Copy)]
pub struct TargetPoint {
    pub target: TargetRef,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    Waiting,
    Countdown,
    Running,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    HpZero,
    Disconnect,
    StageClear,
    CoreDestroyed,
}

impl EndReason {
    pub fn as_str(self) -> &'static str {
        match self {
            EndReason::HpZero => "hp_zero",
            EndReason::Disconnect => "disconnect",
            EndReason::StageClear => "stage_clear",
            EndReason::CoreDestroyed => "core_destroyed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "hp_zero" => Some(EndReason::HpZero),
            "disconnect" => Some(EndReason::Disconnect),
            "stage_clear" => Some(EndReason::StageClear),
            "core_destroyed" => Some(EndReason::CoreDestroyed),
            _ => None,
        }
    }
}

/// Terminal result of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOutcome {
    pub winner_id: Option<u64>,
    pub reason: EndReason,
}
