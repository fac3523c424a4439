use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::public::{LeaderboardResponse, OnlinePlayersResponse, PublicGameResponse},
    services::public_service,
    state::SharedState,
};

/// Public read-only endpoints that expose the current game state.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/public/game", get(get_game))
        .route("/public/players", get(get_online_players))
        .route("/public/leaderboard", get(get_leaderboard))
}

#[utoipa::path(
    get,
    path = "/public/game",
    tag = "public",
    responses((status = 200, description = "Current game status", body = PublicGameResponse))
)]
/// Return the phase, timer and players of the current game.
pub async fn get_game(State(state): State<SharedState>) -> Json<PublicGameResponse> {
    Json(public_service::game_status(&state).await)
}

#[utoipa::path(
    get,
    path = "/public/players",
    tag = "public",
    responses((status = 200, description = "Connected players", body = OnlinePlayersResponse))
)]
/// Return the players currently connected.
pub async fn get_online_players(State(state): State<SharedState>) -> Json<OnlinePlayersResponse> {
    Json(public_service::online_players(&state).await)
}

#[utoipa::path(
    get,
    path = "/public/leaderboard",
    tag = "public",
    responses((status = 200, description = "Top players", body = LeaderboardResponse))
)]
pub async fn get_leaderboard(State(state): State<SharedState>) -> Json<LeaderboardResponse> {
    Json(public_service::leaderboard(&state).await)
}
