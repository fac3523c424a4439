use std::time::SystemTime;

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::{
        common::{GamePhaseSnapshot, GameResultDto, RoundReportDto},
        sse::{
            GameFinishedEvent, PhaseChangedEvent, PlayerEliminatedEvent, RoundScoredEvent,
            ServerEvent, SystemStatus,
        },
    },
    state::{
        SharedState,
        lobby::{Lobby, RoundAdvance},
        state_machine::GamePhase,
        winner::GameResult,
    },
};

const EVENT_PHASE_CHANGED: &str = "phase_changed";
const EVENT_ROUND_SCORED: &str = "round.scored";
const EVENT_PLAYER_ELIMINATED: &str = "player.eliminated";
const EVENT_GAME_FINISHED: &str = "game.finished";
const EVENT_SYSTEM_STATUS: &str = "system.status";

/// Broadcast a game phase change notification.
pub async fn broadcast_phase_changed(state: &SharedState, phase: &GamePhase) {
    let snapshot = build_phase_snapshot(state, phase).await;
    send_public_event(state, EVENT_PHASE_CHANGED, &PhaseChangedEvent(snapshot));
}

/// Broadcast the scoring of a round, then one event per eliminated player.
pub async fn broadcast_round_scored(state: &SharedState, advance: &RoundAdvance) {
    let payload = RoundScoredEvent {
        report: RoundReportDto::from(&advance.report),
        current_round: advance.current_round,
        end_condition_met: advance.end_condition_met,
    };
    send_public_event(state, EVENT_ROUND_SCORED, &payload);

    let lobby = state.lobby().read().await;
    for player_id in advance.report.eliminated() {
        send_elimination(state, &lobby, *player_id);
    }
}

/// Broadcast that a player has been eliminated outside round scoring.
pub async fn broadcast_player_eliminated(state: &SharedState, player_id: Uuid) {
    let lobby = state.lobby().read().await;
    send_elimination(state, &lobby, player_id);
}

/// Broadcast the resolved winner.
pub fn broadcast_game_finished(state: &SharedState, result: &GameResult) {
    let payload = GameFinishedEvent(GameResultDto::from(result));
    send_public_event(state, EVENT_GAME_FINISHED, &payload);
}

/// Broadcast that the backend entered or left degraded mode.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    send_public_event(state, EVENT_SYSTEM_STATUS, &SystemStatus { degraded });
}

/// Snapshot of `phase` enriched with the live lobby.
pub async fn build_phase_snapshot(state: &SharedState, phase: &GamePhase) -> GamePhaseSnapshot {
    let degraded = state.is_degraded().await;
    let lobby = state.lobby().read().await;
    phase_snapshot(&lobby, phase, degraded, SystemTime::now())
}

/// Snapshot of `phase` against an already borrowed lobby.
pub fn phase_snapshot(
    lobby: &Lobby,
    phase: &GamePhase,
    degraded: bool,
    now: SystemTime,
) -> GamePhaseSnapshot {
    let game = lobby.game();
    let time_remaining_seconds = match phase {
        GamePhase::Active(_) => game.map(|game| game.time_remaining_in_round(now)),
        _ => None,
    };

    GamePhaseSnapshot {
        phase: phase.into(),
        game_id: game.map(|game| game.id),
        degraded,
        current_round: phase.current_round(),
        time_remaining_seconds,
        result: lobby.result().map(GameResultDto::from),
    }
}

fn send_elimination(state: &SharedState, lobby: &Lobby, player_id: Uuid) {
    let Some(player) = lobby.roster.get(player_id) else {
        warn!(%player_id, "eliminated player vanished before broadcast");
        return;
    };
    let Some(reason) = player.death_reason else {
        return;
    };
    let payload = PlayerEliminatedEvent {
        player_id,
        display_name: player.display_name.clone(),
        reason,
    };
    send_public_event(state, EVENT_PLAYER_ELIMINATED, &payload);
}

fn send_public_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.public_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}
