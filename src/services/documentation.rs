use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Karma Suits Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::admin::create_game,
        crate::routes::admin::dashboard,
        crate::routes::admin::start_game,
        crate::routes::admin::advance_round,
        crate::routes::admin::pause_round,
        crate::routes::admin::finish_game,
        crate::routes::admin::statistics,
        crate::routes::admin::results,
        crate::routes::admin::adjust_karma,
        crate::routes::admin::reset_player,
        crate::routes::player::register,
        crate::routes::player::get_player,
        crate::routes::player::set_online,
        crate::routes::player::set_offline,
        crate::routes::player::join_game,
        crate::routes::player::leave_game,
        crate::routes::player::choose_symbol,
        crate::routes::player::record_communication,
        crate::routes::player::list_communications,
        crate::routes::player::player_result,
        crate::routes::public::get_game,
        crate::routes::public::get_online_players,
        crate::routes::public::get_leaderboard,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::PhaseChangedEvent,
            crate::dto::sse::RoundScoredEvent,
            crate::dto::sse::PlayerEliminatedEvent,
            crate::dto::sse::GameFinishedEvent,
            crate::dto::phase::VisibleGamePhase,
            crate::state::suit::Suit,
            crate::state::game::GameStatus,
            crate::state::player::DeathReason,
            crate::state::winner::Outcome,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "admin", description = "Facilitator operations"),
        (name = "players", description = "Player self-service"),
        (name = "public", description = "Read-only game status"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route_group() {
        let doc = ApiDoc::openapi();
        for path in [
            "/healthcheck",
            "/sse/public",
            "/admin/games",
            "/admin/games/{id}/advance",
            "/players/{id}/communications",
            "/public/game",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path}");
        }
    }
}
