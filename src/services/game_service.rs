//! Lifecycle helpers shared by the admin and public services.

use std::time::SystemTime;

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dto::common::GameSummary,
    error::ServiceError,
    services::sse_events,
    state::{
        SharedState,
        lobby::{Lobby, RoundAdvance},
        state_machine::{GameEvent, GamePhase},
        transitions::run_transition_with_broadcast,
    },
};

/// Load the last snapshot from the installed store and make it the live lobby.
///
/// Returns `None` when the store holds nothing yet.
pub async fn restore_from_store(state: &SharedState) -> Result<Option<GamePhase>, ServiceError> {
    let store = state.game_store().await.ok_or(ServiceError::Degraded)?;
    let Some(entity) = store.load_lobby().await? else {
        debug!("no lobby snapshot stored");
        return Ok(None);
    };

    let players = entity.players.len();
    let lobby: Lobby = entity.into();
    let phase = state.restore(lobby).await;
    info!(players, phase = ?phase, "lobby restored from storage");
    Ok(Some(phase))
}

/// Score the round being played and deal the next one.
///
/// Without an explicit `from_round` the round currently tracked by the state
/// machine is used, so two concurrent advances still score the round once.
pub async fn advance_round(
    state: &SharedState,
    game_id: Uuid,
    from_round: Option<u32>,
) -> Result<RoundAdvance, ServiceError> {
    let from_round = match from_round {
        Some(round) => round,
        None => state
            .state_machine_phase()
            .await
            .current_round()
            .ok_or_else(|| ServiceError::InvalidState("no round is being played".into()))?,
    };

    let advance = run_transition_with_broadcast(
        state,
        GameEvent::AdvanceRound { from_round },
        |lobby| {
            Ok(lobby.advance_round(
                game_id,
                Some(from_round),
                &mut rand::rng(),
                SystemTime::now(),
            )?)
        },
    )
    .await?;

    sse_events::broadcast_round_scored(state, &advance).await;
    Ok(advance)
}

/// Summary of the game with the given id.
pub async fn game_summary(state: &SharedState, game_id: Uuid) -> Result<GameSummary, ServiceError> {
    let lobby = state.lobby().read().await;
    let game = lobby.require_game(game_id)?;
    Ok(GameSummary::build(game, &lobby, SystemTime::now()))
}
