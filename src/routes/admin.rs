use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::{
        admin::{
            ActionResponse, AdvanceRoundRequest, AdvanceRoundResponse, CreateGameRequest,
            CreateGameResponse, DashboardResponse, GameResultsResponse, GameStatisticsResponse,
            KarmaAdjustmentRequest, KarmaAdjustmentResponse, PauseRequest, StartGameResponse,
        },
        common::{GameResultDto, GameSummary},
    },
    error::AppError,
    services::admin_service,
    state::SharedState,
};

/// Facilitator endpoints driving the game lifecycle.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/admin/games", post(create_game))
        .route("/admin/game", get(dashboard))
        .route("/admin/games/{id}/start", post(start_game))
        .route("/admin/games/{id}/advance", post(advance_round))
        .route("/admin/games/{id}/pause", post(pause_round))
        .route("/admin/games/{id}/finish", post(finish_game))
        .route("/admin/games/{id}/statistics", get(statistics))
        .route("/admin/games/{id}/results", get(results))
        .route("/admin/players/{id}/karma", post(adjust_karma))
        .route("/admin/players/{id}/reset", post(reset_player))
}

#[utoipa::path(
    post,
    path = "/admin/games",
    tag = "admin",
    request_body = CreateGameRequest,
    responses(
        (status = 200, description = "Game created", body = CreateGameResponse),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "A game is already waiting or active"),
        (status = 503, description = "Storage unavailable")
    )
)]
/// Create a new game, enrolling every online player.
pub async fn create_game(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateGameRequest>>,
) -> Result<Json<CreateGameResponse>, AppError> {
    let created = admin_service::create_game(&state, payload).await?;
    Ok(Json(created))
}

#[utoipa::path(
    get,
    path = "/admin/game",
    tag = "admin",
    responses((status = 200, description = "Facilitator dashboard", body = DashboardResponse))
)]
/// Current game, in-game players with their symbols and counters.
pub async fn dashboard(State(state): State<SharedState>) -> Json<DashboardResponse> {
    Json(admin_service::dashboard(&state).await)
}

#[utoipa::path(
    post,
    path = "/admin/games/{id}/start",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses(
        (status = 200, description = "Game started", body = StartGameResponse),
        (status = 404, description = "Unknown game"),
        (status = 409, description = "Game is not waiting"),
        (status = 422, description = "Not enough players")
    )
)]
/// Start round 1.
pub async fn start_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StartGameResponse>, AppError> {
    let started = admin_service::start_game(&state, id).await?;
    Ok(Json(started))
}

#[utoipa::path(
    post,
    path = "/admin/games/{id}/advance",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Game identifier")),
    request_body = AdvanceRoundRequest,
    responses(
        (status = 200, description = "Round scored and next round dealt", body = AdvanceRoundResponse),
        (status = 404, description = "Unknown game"),
        (status = 409, description = "Game not active or round already advanced")
    )
)]
/// Score the current round and deal the next one.
pub async fn advance_round(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<AdvanceRoundRequest>>,
) -> Result<Json<AdvanceRoundResponse>, AppError> {
    let advance = admin_service::advance_round(&state, id, payload).await?;
    Ok(Json(advance))
}

#[utoipa::path(
    post,
    path = "/admin/games/{id}/pause",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Game identifier")),
    request_body = PauseRequest,
    responses(
        (status = 200, description = "Timer paused or resumed", body = GameSummary),
        (status = 404, description = "Unknown game"),
        (status = 409, description = "Round already in the requested state")
    )
)]
/// Pause or resume the round timer.
pub async fn pause_round(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<PauseRequest>>,
) -> Result<Json<GameSummary>, AppError> {
    let summary = admin_service::pause_round(&state, id, payload).await?;
    Ok(Json(summary))
}

#[utoipa::path(
    post,
    path = "/admin/games/{id}/finish",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses(
        (status = 200, description = "Game finished", body = GameResultDto),
        (status = 404, description = "Unknown game"),
        (status = 409, description = "Game not active")
    )
)]
/// Finish the game and resolve the winner.
pub async fn finish_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameResultDto>, AppError> {
    let result = admin_service::finish_game(&state, id).await?;
    Ok(Json(result))
}

#[utoipa::path(
    get,
    path = "/admin/games/{id}/statistics",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses(
        (status = 200, description = "Game statistics", body = GameStatisticsResponse),
        (status = 404, description = "Unknown game")
    )
)]
pub async fn statistics(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameStatisticsResponse>, AppError> {
    let stats = admin_service::statistics(&state, id).await?;
    Ok(Json(stats))
}

#[utoipa::path(
    get,
    path = "/admin/games/{id}/results",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses(
        (status = 200, description = "Result and ranking", body = GameResultsResponse),
        (status = 404, description = "Unknown game"),
        (status = 409, description = "Game not finished")
    )
)]
/// Result and full ranking of a finished game.
pub async fn results(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameResultsResponse>, AppError> {
    let results = admin_service::results(&state, id).await?;
    Ok(Json(results))
}

#[utoipa::path(
    post,
    path = "/admin/players/{id}/karma",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Player identifier")),
    request_body = KarmaAdjustmentRequest,
    responses(
        (status = 200, description = "Karma adjusted", body = KarmaAdjustmentResponse),
        (status = 404, description = "Unknown player")
    )
)]
/// Move a player's karma one step up or down.
pub async fn adjust_karma(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<KarmaAdjustmentRequest>>,
) -> Result<Json<KarmaAdjustmentResponse>, AppError> {
    let adjusted = admin_service::adjust_karma(&state, id, payload).await?;
    Ok(Json(adjusted))
}

#[utoipa::path(
    post,
    path = "/admin/players/{id}/reset",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Player identifier")),
    responses(
        (status = 200, description = "Player reset", body = ActionResponse),
        (status = 404, description = "Unknown player")
    )
)]
/// Reset a player for a new game and drop their statements.
pub async fn reset_player(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ActionResponse>, AppError> {
    let response = admin_service::reset_player(&state, id).await?;
    Ok(Json(response))
}
