use serde::Serialize;
use utoipa::ToSchema;

use crate::dto::common::{GamePhaseSnapshot, GameSummary, PlayerSummary};

/// Public status of the current game.
#[derive(Debug, Serialize, ToSchema)]
pub struct PublicGameResponse {
    #[serde(flatten)]
    pub snapshot: GamePhaseSnapshot,
    pub game: Option<GameSummary>,
    /// Players enrolled in the game, ordered by display name.
    pub players: Vec<PlayerSummary>,
}

/// Response payload listing connected players.
#[derive(Debug, Serialize, ToSchema)]
pub struct OnlinePlayersResponse {
    pub count: usize,
    pub players: Vec<PlayerSummary>,
}

/// One line of the leaderboard.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardEntry {
    pub position: usize,
    pub player: PlayerSummary,
    pub current_game_score: i32,
    pub secrets_discovered_this_game: u32,
}

/// Top players by karma, facilitator score and secrets discovered.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    pub leaderboard: Vec<LeaderboardEntry>,
}
