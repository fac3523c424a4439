use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        common::{GameResultDto, GameSummary, PlayerSummary, RoundReportDto, SuitAssignmentDto},
        format_system_time,
    },
    state::{game::GameStatus, lobby::KarmaAdjustment, player::Player, suit::Suit},
};

/// Request body used to create a new game.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
#[serde(default)]
pub struct CreateGameRequest {
    /// Round length; clamped to the configured bounds.
    #[validate(range(min = 1))]
    pub round_duration_seconds: Option<u64>,
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    /// Start round 1 right after creation.
    pub start_immediately: bool,
}

/// Response returned after creating a game.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateGameResponse {
    pub game: GameSummary,
    /// Round 1 is already being played.
    pub started: bool,
    /// Online players enrolled automatically.
    pub joined_players: usize,
    /// Round 1 symbols when the game was started immediately.
    pub assignments: Vec<SuitAssignmentDto>,
}

/// Response returned after starting a game.
#[derive(Debug, Serialize, ToSchema)]
pub struct StartGameResponse {
    pub game: GameSummary,
    pub assignments: Vec<SuitAssignmentDto>,
}

/// Request body for advancing to the next round.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
#[serde(default)]
pub struct AdvanceRoundRequest {
    /// Round the caller believes is being played; stale values are rejected.
    #[validate(range(min = 1))]
    pub round: Option<u32>,
}

/// Response returned after a round advance.
#[derive(Debug, Serialize, ToSchema)]
pub struct AdvanceRoundResponse {
    pub current_round: u32,
    pub assignments: Vec<SuitAssignmentDto>,
    pub report: RoundReportDto,
    /// Two or fewer players survive; the facilitator should finish the game.
    pub end_condition_met: bool,
}

/// Pause or resume the round timer.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PauseAction {
    /// Freeze the round timer.
    Pause,
    /// Unfreeze the round timer.
    Resume,
}

/// Request body of the pause endpoint.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct PauseRequest {
    pub action: PauseAction,
}

/// Facilitator karma override direction.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KarmaAction {
    /// One step up.
    Increase,
    /// One step down.
    Decrease,
}

impl From<KarmaAction> for KarmaAdjustment {
    fn from(value: KarmaAction) -> Self {
        match value {
            KarmaAction::Increase => KarmaAdjustment::Increase,
            KarmaAction::Decrease => KarmaAdjustment::Decrease,
        }
    }
}

/// Request body of the karma endpoint.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct KarmaAdjustmentRequest {
    pub action: KarmaAction,
}

/// Player as seen by the facilitator, symbols included.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct AdminPlayerView {
    #[serde(flatten)]
    pub player: PlayerSummary,
    pub suit_symbol: Option<Suit>,
    pub chosen_symbol: Option<Suit>,
    pub last_activity: String,
}

impl From<&Player> for AdminPlayerView {
    fn from(player: &Player) -> Self {
        Self {
            player: player.into(),
            suit_symbol: player.suit_symbol,
            chosen_symbol: player.chosen_symbol,
            last_activity: format_system_time(player.last_activity),
        }
    }
}

/// Response of the karma endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct KarmaAdjustmentResponse {
    pub player: AdminPlayerView,
    /// This adjustment eliminated the player.
    pub eliminated: bool,
}

/// Counters shown on the facilitator dashboard.
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    pub registered_players: usize,
    pub online_players: usize,
    pub players_in_game: usize,
    pub alive_players: usize,
    pub communications_this_round: usize,
}

/// Facilitator dashboard.
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub game: Option<GameSummary>,
    /// In-game players ordered by display name.
    pub players: Vec<AdminPlayerView>,
    pub stats: DashboardStats,
}

/// Lightweight game statistics.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameStatisticsResponse {
    pub game_id: Uuid,
    pub status: GameStatus,
    pub total_players: usize,
    pub alive_players: usize,
    pub current_round: u32,
    pub time_remaining_seconds: u64,
    pub is_paused: bool,
    pub end_condition_met: bool,
}

/// One line of the final ranking.
#[derive(Debug, Serialize, ToSchema)]
pub struct RankingEntry {
    /// 1-based position.
    pub position: usize,
    pub player: PlayerSummary,
    pub is_winner: bool,
}

/// Results of a finished game.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameResultsResponse {
    pub game: GameSummary,
    pub result: GameResultDto,
    /// Ordered by lies, then truths, then display name.
    pub ranking: Vec<RankingEntry>,
}

/// Generic response for admin actions.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    pub message: String,
}

impl ActionResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
