use std::time::SystemTime;

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::{format_system_time, phase::VisibleGamePhase},
    state::{
        game::{Game, GameStatus},
        lobby::Lobby,
        player::Player,
        roster::{PlayerFilter, SuitAssignment},
        scoring::RoundReport,
        suit::Suit,
        winner::{GameResult, Outcome},
    },
};

/// Summary of the current game shared by admin and public payloads.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct GameSummary {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub status: GameStatus,
    pub current_round: u32,
    pub round_duration_seconds: u64,
    /// Whole seconds left in the round; zero unless the game is active.
    pub time_remaining_seconds: u64,
    pub is_paused: bool,
    pub created_at: String,
    pub started_at: Option<String>,
    pub players_in_game: usize,
    pub players_alive: usize,
}

impl GameSummary {
    /// Summarise `game` together with the lobby's player counts.
    pub fn build(game: &Game, lobby: &Lobby, now: SystemTime) -> Self {
        Self {
            id: game.id,
            name: game.name.clone(),
            description: game.description.clone(),
            status: game.status,
            current_round: game.current_round,
            round_duration_seconds: game.round_duration.as_secs(),
            time_remaining_seconds: game.time_remaining_in_round(now),
            is_paused: game.is_paused(),
            created_at: format_system_time(game.created_at),
            started_at: game.started_at.map(format_system_time),
            players_in_game: lobby.roster.count(PlayerFilter::InGame),
            players_alive: lobby.roster.survivors(),
        }
    }
}

/// Player as seen by everyone: no symbols.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct PlayerSummary {
    pub id: Uuid,
    pub display_name: String,
    pub karma_score: u8,
    pub karma_level: String,
    pub is_in_game: bool,
    pub is_online: bool,
    pub is_dead: bool,
    /// Human-readable elimination cause.
    pub death_reason: Option<String>,
    pub truths_told: u32,
    pub lies_told: u32,
}

impl From<&Player> for PlayerSummary {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id,
            display_name: player.display_name.clone(),
            karma_score: player.karma_score,
            karma_level: player.karma_level().to_string(),
            is_in_game: player.is_in_game,
            is_online: player.is_online,
            is_dead: player.is_dead(),
            death_reason: player.death_reason.map(|reason| reason.to_string()),
            truths_told: player.truths_told,
            lies_told: player.lies_told,
        }
    }
}

/// Symbol dealt to a player for the new round.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct SuitAssignmentDto {
    pub player_id: Uuid,
    pub display_name: String,
    pub suit: Suit,
}

impl From<SuitAssignment> for SuitAssignmentDto {
    fn from(value: SuitAssignment) -> Self {
        Self {
            player_id: value.player_id,
            display_name: value.display_name,
            suit: value.suit,
        }
    }
}

/// Truth/lie counts attributed to one teller in a round.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct TellerTallyDto {
    pub player_id: Uuid,
    pub truths: u32,
    pub lies: u32,
}

/// Karma move applied to one player at the end of a round.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct KarmaChangeDto {
    pub player_id: Uuid,
    pub before: u8,
    pub after: u8,
}

/// Scoring summary of a finished round.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct RoundReportDto {
    pub round: u32,
    pub communications: usize,
    /// Players eliminated by a missing or wrong symbol guess.
    pub symbol_deaths: Vec<Uuid>,
    /// Players eliminated by reaching a karma bound.
    pub karma_deaths: Vec<Uuid>,
    pub tallies: Vec<TellerTallyDto>,
    pub karma_changes: Vec<KarmaChangeDto>,
}

impl From<&RoundReport> for RoundReportDto {
    fn from(report: &RoundReport) -> Self {
        Self {
            round: report.round,
            communications: report.communications,
            symbol_deaths: report.symbol_deaths.clone(),
            karma_deaths: report.karma_deaths.clone(),
            tallies: report
                .tallies
                .iter()
                .map(|(player_id, tally)| TellerTallyDto {
                    player_id: *player_id,
                    truths: tally.truths,
                    lies: tally.lies,
                })
                .collect(),
            karma_changes: report
                .karma_changes
                .iter()
                .map(|change| KarmaChangeDto {
                    player_id: change.player_id,
                    before: change.before,
                    after: change.after,
                })
                .collect(),
        }
    }
}

/// Winner resolution.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct GameResultDto {
    pub outcome: Outcome,
    pub winner_id: Option<Uuid>,
    pub winner_name: Option<String>,
    pub reason: String,
    pub alive_count: usize,
}

impl From<&GameResult> for GameResultDto {
    fn from(result: &GameResult) -> Self {
        Self {
            outcome: result.outcome,
            winner_id: result.winner,
            winner_name: result.winner_name.clone(),
            reason: result.reason.clone(),
            alive_count: result.alive_count,
        }
    }
}

/// Shared snapshot describing the current game phase and related context.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct GamePhaseSnapshot {
    pub phase: VisibleGamePhase,
    pub game_id: Option<Uuid>,
    /// True when the backend operates without a storage backend.
    pub degraded: bool,
    /// Present while a game is active.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_round: Option<u32>,
    /// Present while a game is active.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_remaining_seconds: Option<u64>,
    /// Present once the game has finished.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<GameResultDto>,
}
