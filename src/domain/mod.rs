// Domain layer: core simulation types and rules.

pub mod abilities;
pub mod ports;
pub mod state;
pub mod systems;
pub mod tuning;

pub use state::{
    ActiveZone, AuthoritativeHealth, EndReason, EnemyKind, FrameInput, LocalHealth, MatchOutcome,
    MatchPhase, RemoteEntity, RemoteKind, SimEnemy, SimProjectile, TargetPoint, TargetRef,
};
