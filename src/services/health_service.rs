use tracing::warn;

use crate::{
    dto::health::{HealthResponse, HealthStatus},
    state::SharedState,
};

/// Probe the store and summarise the lobby.
///
/// A failing probe reports `degraded` right away; the storage supervisor is the
/// one that actually uninstalls the store.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let store_reachable = match state.game_store().await {
        Some(store) => match store.health_check().await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "storage health check failed");
                false
            }
        },
        None => {
            warn!("storage unavailable (degraded mode)");
            false
        }
    };

    let phase = state.state_machine_phase().await;
    let lobby = state.lobby().read().await;
    HealthResponse {
        status: if store_reachable {
            HealthStatus::Ok
        } else {
            HealthStatus::Degraded
        },
        phase: (&phase).into(),
        registered_players: lobby.roster.len(),
        online_players: lobby.roster.iter().filter(|player| player.is_online).count(),
        sse_subscribers: state.public_sse().receiver_count(),
    }
}
