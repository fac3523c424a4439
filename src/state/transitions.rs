use tracing::debug;

use crate::{
    error::ServiceError,
    services::sse_events::broadcast_phase_changed,
    state::{SharedState, lobby::Lobby, state_machine::GameEvent},
};

/// Run a lifecycle transition and announce the phase it lands in.
///
/// Nothing is broadcast when the transition fails.
pub async fn run_transition_with_broadcast<F, T>(
    state: &SharedState,
    event: GameEvent,
    work: F,
) -> Result<T, ServiceError>
where
    F: FnOnce(&mut Lobby) -> Result<T, ServiceError>,
{
    let label = format!("{event:?}");
    let (value, next) = state.run_transition(event, work).await?;
    debug!(event = %label, phase = ?next, "lifecycle moved");
    broadcast_phase_changed(state, &next).await;
    Ok(value)
}
