use std::time::SystemTime;

use tracing::{debug, warn};

use crate::{
    dto::{
        common::{GameSummary, PlayerSummary},
        public::{LeaderboardEntry, LeaderboardResponse, OnlinePlayersResponse, PublicGameResponse},
    },
    error::ServiceError,
    services::{game_service, sse_events},
    state::{SharedState, player::Player, roster::PlayerFilter},
};

/// Entries returned by the leaderboard.
const LEADERBOARD_SIZE: usize = 20;

/// Public status of the current game.
///
/// With `auto_advance` configured, an elapsed round is advanced first.
pub async fn game_status(state: &SharedState) -> PublicGameResponse {
    if state.config().auto_advance {
        auto_advance_elapsed_round(state).await;
    }

    let phase = state.state_machine_phase().await;
    let degraded = state.is_degraded().await;
    let now = SystemTime::now();
    let lobby = state.lobby().read().await;

    let mut players: Vec<PlayerSummary> = lobby
        .roster
        .filtered(PlayerFilter::InGame)
        .map(PlayerSummary::from)
        .collect();
    players.sort_by(|a, b| a.display_name.cmp(&b.display_name));

    PublicGameResponse {
        snapshot: sse_events::phase_snapshot(&lobby, &phase, degraded, now),
        game: lobby.game().map(|game| GameSummary::build(game, &lobby, now)),
        players,
    }
}

/// Connected players ordered by display name.
pub async fn online_players(state: &SharedState) -> OnlinePlayersResponse {
    let lobby = state.lobby().read().await;
    let mut players: Vec<PlayerSummary> = lobby
        .roster
        .filtered(PlayerFilter::Online)
        .map(PlayerSummary::from)
        .collect();
    players.sort_by(|a, b| a.display_name.cmp(&b.display_name));

    OnlinePlayersResponse {
        count: players.len(),
        players,
    }
}

/// Top players by karma, facilitator score, secrets discovered, then name.
pub async fn leaderboard(state: &SharedState) -> LeaderboardResponse {
    let lobby = state.lobby().read().await;
    let mut players: Vec<&Player> = lobby.roster.iter().collect();
    players.sort_by(|a, b| {
        b.karma_score
            .cmp(&a.karma_score)
            .then(b.current_game_score.cmp(&a.current_game_score))
            .then(b.secrets_discovered_this_game.cmp(&a.secrets_discovered_this_game))
            .then_with(|| a.display_name.cmp(&b.display_name))
    });

    LeaderboardResponse {
        leaderboard: players
            .into_iter()
            .take(LEADERBOARD_SIZE)
            .enumerate()
            .map(|(index, player)| LeaderboardEntry {
                position: index + 1,
                current_game_score: player.current_game_score,
                secrets_discovered_this_game: player.secrets_discovered_this_game,
                player: PlayerSummary::from(player),
            })
            .collect(),
    }
}

/// Advance the round if its timer ran out. Failures are logged, never surfaced
/// to the reader.
async fn auto_advance_elapsed_round(state: &SharedState) {
    let elapsed = {
        let lobby = state.lobby().read().await;
        lobby
            .active_game()
            .filter(|game| !game.is_paused() && game.is_round_finished(SystemTime::now()))
            .map(|game| (game.id, game.current_round))
    };
    let Some((game_id, round)) = elapsed else {
        return;
    };

    match game_service::advance_round(state, game_id, Some(round)).await {
        Ok(advance) => debug!(%game_id, current_round = advance.current_round, "elapsed round advanced"),
        Err(ServiceError::InvalidState(reason)) => {
            debug!(%game_id, round, %reason, "elapsed round already handled")
        }
        Err(err) => warn!(%game_id, round, error = %err, "failed to auto-advance elapsed round"),
    }
}
