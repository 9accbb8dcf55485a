// Wire protocol DTOs and conversions for the public game server messages.
//
// Everything inbound is sanitized field-by-field: non-finite numbers are
// dropped (the finite fields still apply), unparseable ids drop the record.
// Nothing in this module panics on hostile input.

use crate::domain::abilities::AbilityKey;
use crate::domain::state::{EndReason, EnemyKind, RemoteKind};
use crate::use_cases::types::{
    ClientCommand, EntityState, PhaseEvent, ServerEvent, WorldSnapshot,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Messages the authority sends to the client over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    // Assigned identity for the connection after Join is accepted.
    Identity { player_id: String },
    // High-level match lifecycle transitions.
    GameState(GameStateDto),
    // Snapshot of the networked world for a given tick.
    WorldUpdate(WorldUpdateDto),
    // Authoritative resolution of a previously reported hit.
    DamageConfirm(DamageConfirmDto),
    // A server-simulated enemy entered the world.
    EnemySpawn(EnemySpawnDto),
    // Verdict on a pending ability pick.
    PickResult(PickResultDto),
    // A peer's cosmetic skill effect, relayed for replication.
    SkillFx(SkillFxDto),
    Pong { nonce: u64 },
}

/// Messages the client sends to the authority over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    // Initial handshake message with identity metadata.
    Join(JoinPayload),
    // Throttled input/state report sent while the match runs.
    Input(InputReportDto),
    // A hit against a networked target, for the authority to arbitrate.
    DamageReport(DamageReportDto),
    // Cosmetic broadcast so the peer can render the same effect.
    SkillFx(SkillFxDto),
    // Level-up pick proposal awaiting confirmation.
    PickRequest { key: AbilityKey },
    Ping { nonce: u64 },
}

#[derive(Debug, Clone, Serialize)]
pub struct JoinPayload {
    pub session_token: String,
    pub display_name: String,
    pub mode: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InputReportDto {
    pub move_x: f32,
    pub move_y: f32,
    pub aim_x: f32,
    pub aim_y: f32,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DamageReportDto {
    // Unique per-hit id so the authority can dedupe retransmits.
    pub hit_id: String,
    pub target_id: String,
    pub amount: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ability: Option<AbilityKey>,
}

/// Match lifecycle state as the authority announces it.
#[derive(Debug, Clone, Deserialize)]
pub enum GameStateDto {
    Waiting,
    Countdown(CountdownDto),
    Running,
    Ended(MatchEndDto),
}

#[derive(Debug, Clone, Deserialize)]
pub struct CountdownDto {
    pub seconds: f32,
    #[serde(default)]
    pub start_x: Option<f32>,
    #[serde(default)]
    pub start_y: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchEndDto {
    #[serde(default)]
    pub winner_id: Option<String>,
    pub reason: String,
}

/// Flattened entity state inside world updates.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityStateDto {
    pub id: String,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub vx: Option<f32>,
    #[serde(default)]
    pub vy: Option<f32>,
    #[serde(default)]
    pub hp: Option<i32>,
    #[serde(default)]
    pub max_hp: Option<i32>,
    #[serde(default)]
    pub level: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorldUpdateDto {
    pub tick: u64,
    pub server_time_ms: u64,
    pub entities: Vec<EntityStateDto>,
    #[serde(default)]
    pub enemies: Vec<EntityStateDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DamageConfirmDto {
    pub target_id: String,
    pub new_hp: i32,
    pub amount: i32,
    pub source_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnemySpawnDto {
    pub id: String,
    pub kind: EnemyKind,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub vx: f32,
    #[serde(default)]
    pub vy: f32,
    pub hp: i32,
    pub max_hp: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PickResultDto {
    pub key: AbilityKey,
    pub accepted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillFxDto {
    pub key: AbilityKey,
    pub x: f32,
    pub y: f32,
    pub dir_x: f32,
    pub dir_y: f32,
    pub rank: u8,
}

fn finite(value: f32) -> Option<f32> {
    value.is_finite().then_some(value)
}

impl EntityStateDto {
    /// Field-level sanitization: only the finite fields survive.
    fn sanitize(&self, kind: RemoteKind) -> Option<EntityState> {
        let id = self.id.parse().ok()?;
        Some(EntityState {
            id,
            kind,
            x: finite(self.x),
            y: finite(self.y),
            vx: self.vx.and_then(finite),
            vy: self.vy.and_then(finite),
            hp: self.hp,
            max_hp: self.max_hp,
            level: self.level,
        })
    }
}

impl From<GameStateDto> for PhaseEvent {
    fn from(dto: GameStateDto) -> Self {
        match dto {
            GameStateDto::Waiting => PhaseEvent::Waiting,
            GameStateDto::Countdown(countdown) => {
                let seconds = finite(countdown.seconds).unwrap_or(0.0).max(0.0);
                let start_position = match (
                    countdown.start_x.and_then(finite),
                    countdown.start_y.and_then(finite),
                ) {
                    (Some(x), Some(y)) => Some((x, y)),
                    _ => None,
                };
                PhaseEvent::Countdown {
                    seconds,
                    start_position,
                }
            }
            GameStateDto::Running => PhaseEvent::Running,
            GameStateDto::Ended(end) => {
                let reason = EndReason::parse(&end.reason).unwrap_or_else(|| {
                    warn!(reason = %end.reason, "unknown match end reason");
                    EndReason::HpZero
                });
                PhaseEvent::Ended {
                    winner_id: end.winner_id.and_then(|id| id.parse().ok()),
                    reason,
                }
            }
        }
    }
}

/// Converts an inbound message into a session event, dropping anything that
/// does not survive sanitization. Identity and Pong are handled by the
/// network adapter itself and never reach the session.
pub fn to_event(message: ServerMessage) -> Option<ServerEvent> {
    match message {
        ServerMessage::Identity { .. } | ServerMessage::Pong { .. } => None,
        ServerMessage::GameState(dto) => Some(ServerEvent::Phase(dto.into())),
        ServerMessage::WorldUpdate(dto) => {
            let mut entities: Vec<EntityState> = dto
                .entities
                .iter()
                .filter_map(|e| e.sanitize(RemoteKind::Opponent))
                .collect();
            entities.extend(
                dto.enemies
                    .iter()
                    .filter_map(|e| e.sanitize(RemoteKind::Enemy)),
            );
            Some(ServerEvent::Snapshot(WorldSnapshot {
                server_time_ms: dto.server_time_ms,
                entities,
            }))
        }
        ServerMessage::DamageConfirm(dto) => Some(ServerEvent::DamageConfirmed {
            target_id: dto.target_id.parse().ok()?,
            new_hp: dto.new_hp,
            amount: dto.amount,
            source_id: dto.source_id.parse().unwrap_or(0),
        }),
        ServerMessage::EnemySpawn(dto) => Some(ServerEvent::EnemySpawned {
            id: dto.id.parse().ok()?,
            kind: dto.kind,
            x: finite(dto.x)?,
            y: finite(dto.y)?,
            vx: finite(dto.vx).unwrap_or(0.0),
            vy: finite(dto.vy).unwrap_or(0.0),
            hp: dto.hp,
            max_hp: dto.max_hp,
        }),
        ServerMessage::PickResult(dto) => Some(ServerEvent::PickResolved {
            key: dto.key,
            accepted: dto.accepted,
        }),
        ServerMessage::SkillFx(dto) => Some(ServerEvent::PeerFx {
            key: dto.key,
            x: finite(dto.x)?,
            y: finite(dto.y)?,
            dir_x: finite(dto.dir_x).unwrap_or(0.0),
            dir_y: finite(dto.dir_y).unwrap_or(0.0),
            rank: dto.rank,
        }),
    }
}

/// Converts a session command into its wire form. The display name rides on
/// input reports so the peer HUD can label the opponent.
pub fn to_wire(command: &ClientCommand, display_name: &str) -> ClientMessage {
    match command {
        ClientCommand::Input {
            move_x,
            move_y,
            aim_x,
            aim_y,
        } => ClientMessage::Input(InputReportDto {
            move_x: *move_x,
            move_y: *move_y,
            aim_x: *aim_x,
            aim_y: *aim_y,
            display_name: display_name.to_string(),
        }),
        ClientCommand::DamageReport {
            hit_id,
            target_id,
            amount,
            ability,
        } => ClientMessage::DamageReport(DamageReportDto {
            hit_id: hit_id.to_string(),
            target_id: target_id.to_string(),
            amount: *amount,
            ability: *ability,
        }),
        ClientCommand::SkillFx {
            key,
            x,
            y,
            dir_x,
            dir_y,
            rank,
        } => ClientMessage::SkillFx(SkillFxDto {
            key: *key,
            x: *x,
            y: *y,
            dir_x: *dir_x,
            dir_y: *dir_y,
            rank: *rank,
        }),
        ClientCommand::PickRequest { key } => ClientMessage::PickRequest { key: *key },
    }
}
