use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::player::{
        ChooseSymbolRequest, CommunicationsQuery, CommunicationsResponse, PlayerResultResponse,
        PlayerView, RegisterPlayerRequest, TellSymbolRequest, TellSymbolResponse,
    },
    error::AppError,
    services::player_service,
    state::SharedState,
};

/// Player self-service endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/players", post(register))
        .route("/players/{id}", get(get_player))
        .route("/players/{id}/online", post(set_online))
        .route("/players/{id}/offline", post(set_offline))
        .route("/players/{id}/join", post(join_game))
        .route("/players/{id}/leave", post(leave_game))
        .route("/players/{id}/symbol", post(choose_symbol))
        .route(
            "/players/{id}/communications",
            post(record_communication).get(list_communications),
        )
        .route("/players/{id}/result", get(player_result))
}

#[utoipa::path(
    post,
    path = "/players",
    tag = "players",
    request_body = RegisterPlayerRequest,
    responses(
        (status = 200, description = "Player registered", body = PlayerView),
        (status = 400, description = "Blank, too long or duplicate display name")
    )
)]
/// Register a new player.
pub async fn register(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<RegisterPlayerRequest>>,
) -> Result<Json<PlayerView>, AppError> {
    let player = player_service::register(&state, payload).await?;
    Ok(Json(player))
}

#[utoipa::path(
    get,
    path = "/players/{id}",
    tag = "players",
    params(("id" = Uuid, Path, description = "Player identifier")),
    responses(
        (status = 200, description = "Player", body = PlayerView),
        (status = 404, description = "Unknown player")
    )
)]
pub async fn get_player(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlayerView>, AppError> {
    let player = player_service::get_player(&state, id).await?;
    Ok(Json(player))
}

#[utoipa::path(
    post,
    path = "/players/{id}/online",
    tag = "players",
    params(("id" = Uuid, Path, description = "Player identifier")),
    responses(
        (status = 200, description = "Player marked online", body = PlayerView),
        (status = 404, description = "Unknown player")
    )
)]
pub async fn set_online(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlayerView>, AppError> {
    let player = player_service::set_online(&state, id).await?;
    Ok(Json(player))
}

#[utoipa::path(
    post,
    path = "/players/{id}/offline",
    tag = "players",
    params(("id" = Uuid, Path, description = "Player identifier")),
    responses(
        (status = 200, description = "Player marked offline", body = PlayerView),
        (status = 404, description = "Unknown player")
    )
)]
/// Mark the player offline; they stay in the game.
pub async fn set_offline(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlayerView>, AppError> {
    let player = player_service::set_offline(&state, id).await?;
    Ok(Json(player))
}

#[utoipa::path(
    post,
    path = "/players/{id}/join",
    tag = "players",
    params(("id" = Uuid, Path, description = "Player identifier")),
    responses(
        (status = 200, description = "Player joined", body = PlayerView),
        (status = 404, description = "Unknown player"),
        (status = 409, description = "Rounds are being played")
    )
)]
pub async fn join_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlayerView>, AppError> {
    let player = player_service::join_game(&state, id).await?;
    Ok(Json(player))
}

#[utoipa::path(
    post,
    path = "/players/{id}/leave",
    tag = "players",
    params(("id" = Uuid, Path, description = "Player identifier")),
    responses(
        (status = 200, description = "Player left", body = PlayerView),
        (status = 404, description = "Unknown player"),
        (status = 409, description = "Rounds are being played")
    )
)]
pub async fn leave_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlayerView>, AppError> {
    let player = player_service::leave_game(&state, id).await?;
    Ok(Json(player))
}

#[utoipa::path(
    post,
    path = "/players/{id}/symbol",
    tag = "players",
    params(("id" = Uuid, Path, description = "Player identifier")),
    request_body = ChooseSymbolRequest,
    responses(
        (status = 200, description = "Guess recorded", body = PlayerView),
        (status = 400, description = "Invalid symbol"),
        (status = 404, description = "Unknown player"),
        (status = 409, description = "No active round, player not in game or eliminated")
    )
)]
/// Record the player's guess of their own symbol.
pub async fn choose_symbol(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<ChooseSymbolRequest>>,
) -> Result<Json<PlayerView>, AppError> {
    let player = player_service::choose_symbol(&state, id, payload).await?;
    Ok(Json(player))
}

#[utoipa::path(
    post,
    path = "/players/{id}/communications",
    tag = "players",
    params(("id" = Uuid, Path, description = "Receiving player identifier")),
    request_body = TellSymbolRequest,
    responses(
        (status = 200, description = "Statement recorded", body = TellSymbolResponse),
        (status = 400, description = "Invalid symbol or self-report"),
        (status = 404, description = "Unknown player"),
        (status = 409, description = "No active round or player not in game")
    )
)]
/// Record what another player told this player about their symbol.
pub async fn record_communication(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<TellSymbolRequest>>,
) -> Result<Json<TellSymbolResponse>, AppError> {
    let recorded = player_service::record_communication(&state, id, payload).await?;
    Ok(Json(recorded))
}

#[utoipa::path(
    get,
    path = "/players/{id}/communications",
    tag = "players",
    params(("id" = Uuid, Path, description = "Receiving player identifier"), CommunicationsQuery),
    responses(
        (status = 200, description = "Statements received", body = CommunicationsResponse),
        (status = 404, description = "Unknown player"),
        (status = 409, description = "No game to default the round from")
    )
)]
/// Statements received in a round, most recent first.
pub async fn list_communications(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Query(query)): Valid<Query<CommunicationsQuery>>,
) -> Result<Json<CommunicationsResponse>, AppError> {
    let communications = player_service::communications(&state, id, query).await?;
    Ok(Json(communications))
}

#[utoipa::path(
    get,
    path = "/players/{id}/result",
    tag = "players",
    params(("id" = Uuid, Path, description = "Player identifier")),
    responses(
        (status = 200, description = "Outcome for this player", body = PlayerResultResponse),
        (status = 404, description = "Unknown player"),
        (status = 409, description = "Game not finished or player did not take part")
    )
)]
/// "Did I win" view of the finished game.
pub async fn player_result(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlayerResultResponse>, AppError> {
    let result = player_service::player_result(&state, id).await?;
    Ok(Json(result))
}
