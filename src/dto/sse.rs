use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::common::{GamePhaseSnapshot, GameResultDto, RoundReportDto},
    state::player::DeathReason,
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Raw text payload.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Identifier of the SSE stream.
    pub stream: String,
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether the backend is running without a storage backend.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Broadcast whenever the game phase changes.
pub struct PhaseChangedEvent(pub GamePhaseSnapshot);

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast after a round has been scored.
pub struct RoundScoredEvent {
    pub report: RoundReportDto,
    pub current_round: u32,
    pub end_condition_met: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast for every elimination.
pub struct PlayerEliminatedEvent {
    pub player_id: Uuid,
    pub display_name: String,
    pub reason: DeathReason,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Broadcast once the winner is resolved.
pub struct GameFinishedEvent(pub GameResultDto);
