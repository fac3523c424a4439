//! Business logic powering the facilitator routes. Lifecycle changes go
//! through the guarded state-machine transitions; overrides on single
//! players go through the lobby write path.

use std::time::SystemTime;

use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dto::{
        admin::{
            ActionResponse, AdminPlayerView, AdvanceRoundRequest, AdvanceRoundResponse,
            CreateGameRequest, CreateGameResponse, DashboardResponse, DashboardStats,
            GameResultsResponse, GameStatisticsResponse, KarmaAdjustmentRequest,
            KarmaAdjustmentResponse, PauseAction, PauseRequest, RankingEntry, StartGameResponse,
        },
        common::{GameResultDto, GameSummary, PlayerSummary, RoundReportDto},
    },
    error::ServiceError,
    services::{game_service, sse_events},
    state::{
        SharedState,
        game::{GameSettings, GameStatus},
        lobby::Lobby,
        player::Player,
        roster::PlayerFilter,
        state_machine::GameEvent,
        transitions::run_transition_with_broadcast,
    },
};

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Create a waiting game, optionally starting round 1 right away.
pub async fn create_game(
    state: &SharedState,
    request: CreateGameRequest,
) -> Result<CreateGameResponse, ServiceError> {
    let now = SystemTime::now();
    let round_duration = state.config().round_duration(request.round_duration_seconds);
    let settings = GameSettings {
        name: request
            .name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| default_game_name(now)),
        description: request.description.unwrap_or_else(|| {
            format!("Local game with rounds of {} seconds", round_duration.as_secs())
        }),
        round_duration,
    };

    let created = run_transition_with_broadcast(state, GameEvent::CreateGame, |lobby| {
        Ok(lobby.create_game(settings, now)?)
    })
    .await?;

    let mut assignments = Vec::new();
    if request.start_immediately {
        match start_game(state, created.game_id).await {
            Ok(started) => assignments = started.assignments,
            Err(err @ ServiceError::PreconditionNotMet(_)) => {
                warn!(game_id = %created.game_id, error = %err, "game created but left waiting");
            }
            Err(err) => return Err(err),
        }
    }

    let game = game_service::game_summary(state, created.game_id).await?;
    Ok(CreateGameResponse {
        started: game.status == GameStatus::Active,
        game,
        joined_players: created.joined,
        assignments,
    })
}

/// Start round 1 of a waiting game.
pub async fn start_game(
    state: &SharedState,
    game_id: Uuid,
) -> Result<StartGameResponse, ServiceError> {
    let min_players = state.config().min_players;
    let assignments = run_transition_with_broadcast(state, GameEvent::StartGame, |lobby| {
        Ok(lobby.start_game(game_id, min_players, &mut rand::rng(), SystemTime::now())?)
    })
    .await?;

    Ok(StartGameResponse {
        game: game_service::game_summary(state, game_id).await?,
        assignments: assignments.into_iter().map(Into::into).collect(),
    })
}

/// Score the current round and deal the next one.
pub async fn advance_round(
    state: &SharedState,
    game_id: Uuid,
    request: AdvanceRoundRequest,
) -> Result<AdvanceRoundResponse, ServiceError> {
    let advance = game_service::advance_round(state, game_id, request.round).await?;
    Ok(AdvanceRoundResponse {
        current_round: advance.current_round,
        report: RoundReportDto::from(&advance.report),
        assignments: advance.assignments.into_iter().map(Into::into).collect(),
        end_condition_met: advance.end_condition_met,
    })
}

/// Pause or resume the round timer.
pub async fn pause_round(
    state: &SharedState,
    game_id: Uuid,
    request: PauseRequest,
) -> Result<GameSummary, ServiceError> {
    let now = SystemTime::now();
    match request.action {
        PauseAction::Pause => {
            run_transition_with_broadcast(state, GameEvent::PauseRound, |lobby| {
                Ok(lobby.pause_round(game_id, now)?)
            })
            .await?
        }
        PauseAction::Resume => {
            run_transition_with_broadcast(state, GameEvent::ResumeRound, |lobby| {
                Ok(lobby.resume_round(game_id, now)?)
            })
            .await?
        }
    }

    game_service::game_summary(state, game_id).await
}

/// Finish the game and resolve the winner.
pub async fn finish_game(state: &SharedState, game_id: Uuid) -> Result<GameResultDto, ServiceError> {
    let result = run_transition_with_broadcast(state, GameEvent::FinishGame, |lobby| {
        Ok(lobby.finish_game(game_id)?)
    })
    .await?;

    sse_events::broadcast_game_finished(state, &result);
    Ok(GameResultDto::from(&result))
}

// ---------------------------------------------------------------------------
// Read-only projections
// ---------------------------------------------------------------------------

/// Facilitator dashboard: game, in-game players with their symbols, counters.
pub async fn dashboard(state: &SharedState) -> DashboardResponse {
    let now = SystemTime::now();
    let lobby = state.lobby().read().await;

    let mut players: Vec<AdminPlayerView> = lobby
        .roster
        .filtered(PlayerFilter::InGame)
        .map(AdminPlayerView::from)
        .collect();
    players.sort_by(|a, b| a.player.display_name.cmp(&b.player.display_name));

    let communications_this_round = lobby
        .active_game()
        .map(|game| lobby.ledger.records_for_round(game.current_round).count())
        .unwrap_or_default();

    DashboardResponse {
        game: lobby.game().map(|game| GameSummary::build(game, &lobby, now)),
        players,
        stats: DashboardStats {
            registered_players: lobby.roster.len(),
            online_players: lobby.roster.count(PlayerFilter::Online),
            players_in_game: lobby.roster.count(PlayerFilter::InGame),
            alive_players: lobby.roster.survivors(),
            communications_this_round,
        },
    }
}

/// Player count, round and timer of the given game.
pub async fn statistics(
    state: &SharedState,
    game_id: Uuid,
) -> Result<GameStatisticsResponse, ServiceError> {
    let lobby = state.lobby().read().await;
    let game = lobby.require_game(game_id)?;
    Ok(GameStatisticsResponse {
        game_id,
        status: game.status,
        total_players: lobby.roster.count(PlayerFilter::InGame),
        alive_players: lobby.roster.survivors(),
        current_round: game.current_round,
        time_remaining_seconds: game.time_remaining_in_round(SystemTime::now()),
        is_paused: game.is_paused(),
        end_condition_met: game.status == GameStatus::Active && lobby.end_condition_met(),
    })
}

/// Result and full ranking of a finished game.
pub async fn results(
    state: &SharedState,
    game_id: Uuid,
) -> Result<GameResultsResponse, ServiceError> {
    let lobby = state.lobby().read().await;
    let game = lobby.require_game(game_id)?;
    let Some(result) = game.result.as_ref().filter(|_| game.status == GameStatus::Finished) else {
        return Err(ServiceError::InvalidState(
            "results are only available for finished games".into(),
        ));
    };

    let ranking = ranking(&lobby)
        .into_iter()
        .enumerate()
        .map(|(index, player)| RankingEntry {
            position: index + 1,
            is_winner: result.is_winner(player.id),
            player: PlayerSummary::from(player),
        })
        .collect();

    Ok(GameResultsResponse {
        game: GameSummary::build(game, &lobby, SystemTime::now()),
        result: GameResultDto::from(result),
        ranking,
    })
}

/// In-game players by lies, then truths (both descending), then name.
fn ranking(lobby: &Lobby) -> Vec<&Player> {
    let mut players: Vec<&Player> = lobby.roster.filtered(PlayerFilter::InGame).collect();
    players.sort_by(|a, b| {
        b.lies_told
            .cmp(&a.lies_told)
            .then(b.truths_told.cmp(&a.truths_told))
            .then_with(|| a.display_name.cmp(&b.display_name))
    });
    players
}

// ---------------------------------------------------------------------------
// Player overrides
// ---------------------------------------------------------------------------

/// Move a player's karma one step, possibly eliminating them.
pub async fn adjust_karma(
    state: &SharedState,
    player_id: Uuid,
    request: KarmaAdjustmentRequest,
) -> Result<KarmaAdjustmentResponse, ServiceError> {
    let (eliminated, player) = state
        .mutate_lobby(|lobby| {
            let eliminated = lobby.adjust_karma(player_id, request.action.into())?;
            let player = lobby.roster.require(player_id)?;
            Ok((eliminated, AdminPlayerView::from(player)))
        })
        .await?;

    info!(%player_id, action = ?request.action, karma = player.player.karma_score, eliminated, "karma adjusted");
    if eliminated {
        sse_events::broadcast_player_eliminated(state, player_id).await;
    }
    Ok(KarmaAdjustmentResponse { player, eliminated })
}

/// Reset a single player for a new game, dropping every statement involving them.
pub async fn reset_player(
    state: &SharedState,
    player_id: Uuid,
) -> Result<ActionResponse, ServiceError> {
    let purged = state
        .mutate_lobby(|lobby| Ok(lobby.reset_player(player_id)?))
        .await?;
    info!(%player_id, purged, "player reset");
    Ok(ActionResponse::new(format!(
        "player reset, {purged} communications removed"
    )))
}

fn default_game_name(now: SystemTime) -> String {
    let at = OffsetDateTime::from(now);
    format!(
        "Deduction game - {:02}/{:02} {:02}:{:02}",
        at.day(),
        u8::from(at.month()),
        at.hour(),
        at.minute()
    )
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn default_name_uses_day_and_time() {
        let at = SystemTime::UNIX_EPOCH + Duration::from_secs(86_400 + 3_600 + 120);
        assert_eq!(default_game_name(at), "Deduction game - 02/01 01:02");
    }
}
