use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        common::{GameResultDto, PlayerSummary},
        format_system_time,
        validation::{validate_display_name, validate_symbol},
    },
    state::{
        game::GameStatus,
        ledger::{Communication, RecordOutcome},
        player::Player,
        suit::Suit,
    },
};

/// Request body used to register a player.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RegisterPlayerRequest {
    #[validate(custom(function = "validate_display_name"))]
    pub display_name: String,
}

/// A player's own view: their guess, never their dealt symbol.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerView {
    #[serde(flatten)]
    pub player: PlayerSummary,
    pub chosen_symbol: Option<Suit>,
    pub registered_at: String,
    pub last_activity: String,
}

impl From<&Player> for PlayerView {
    fn from(player: &Player) -> Self {
        Self {
            player: player.into(),
            chosen_symbol: player.chosen_symbol,
            registered_at: format_system_time(player.registered_at),
            last_activity: format_system_time(player.last_activity),
        }
    }
}

/// Request body carrying the player's guess of their own symbol.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ChooseSymbolRequest {
    /// One of ♠ ♥ ♦ ♣.
    #[validate(custom(function = "validate_symbol"))]
    pub symbol: String,
}

/// Request body recording what `teller_id` told the player.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct TellSymbolRequest {
    pub teller_id: Uuid,
    /// One of ♠ ♥ ♦ ♣.
    #[validate(custom(function = "validate_symbol"))]
    pub symbol: String,
}

/// Whether the statement was new or overwrote an earlier one.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecordAction {
    Created,
    Updated,
}

impl From<RecordOutcome> for RecordAction {
    fn from(value: RecordOutcome) -> Self {
        match value {
            RecordOutcome::Created => RecordAction::Created,
            RecordOutcome::Updated => RecordAction::Updated,
        }
    }
}

/// Response of the communication endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct TellSymbolResponse {
    pub round: u32,
    pub action: RecordAction,
    pub message: String,
}

/// Query string of the communications listing.
#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct CommunicationsQuery {
    /// Defaults to the current round.
    #[validate(range(min = 1))]
    pub round: Option<u32>,
}

/// A statement received by the player.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReceivedCommunication {
    pub teller_id: Uuid,
    pub teller_name: Option<String>,
    pub told_symbol: Suit,
    pub recorded_at: String,
    pub updated_at: String,
}

impl ReceivedCommunication {
    pub fn build(record: &Communication, teller_name: Option<String>) -> Self {
        Self {
            teller_id: record.teller,
            teller_name,
            told_symbol: record.told_symbol,
            recorded_at: format_system_time(record.recorded_at),
            updated_at: format_system_time(record.updated_at),
        }
    }
}

/// Statements received by the player in a round, most recent first.
#[derive(Debug, Serialize, ToSchema)]
pub struct CommunicationsResponse {
    pub round: u32,
    pub communications: Vec<ReceivedCommunication>,
}

/// "Did I win" view of a finished game.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerResultResponse {
    pub game_id: Uuid,
    pub status: GameStatus,
    pub player: PlayerSummary,
    pub is_winner: bool,
    pub is_tie: bool,
    pub result: GameResultDto,
}
