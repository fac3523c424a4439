use serde::Serialize;
use utoipa::ToSchema;

use crate::state::state_machine::GamePhase;

/// Publicly visible game phase exposed to clients (REST/SSE).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleGamePhase {
    /// No game has been created.
    Idle,
    /// Game created, players are joining.
    Waiting,
    /// A round is being played.
    Running,
    /// The current round is paused.
    Paused,
    /// Game over, results available.
    Finished,
}

impl From<&GamePhase> for VisibleGamePhase {
    fn from(value: &GamePhase) -> Self {
        match value {
            GamePhase::Idle => VisibleGamePhase::Idle,
            GamePhase::Waiting => VisibleGamePhase::Waiting,
            GamePhase::Active(round) if round.paused => VisibleGamePhase::Paused,
            GamePhase::Active(_) => VisibleGamePhase::Running,
            GamePhase::Finished => VisibleGamePhase::Finished,
        }
    }
}
