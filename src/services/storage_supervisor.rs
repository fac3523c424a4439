use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{game_store::GameStore, storage::StorageError},
    services::{sse_events, sse_service},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Poll the installed store and keep the shared state in degraded mode while
/// it is unhealthy, reconnecting with exponential backoff.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn GameStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        if let Some(store) = state.game_store().await {
            match store.health_check().await {
                Ok(()) => {
                    delay = INITIAL_DELAY;
                    sleep(HEALTH_POLL_INTERVAL).await;
                }
                Err(err) => {
                    warn!(error = %err, "storage health check failed; entering degraded mode");
                    state.clear_game_store().await;
                    announce(&state, true);
                    sleep(delay).await;
                    delay = (delay * 2).min(MAX_DELAY);
                }
            }
            continue;
        }

        match connect().await {
            Ok(store) => {
                info!("storage connection established; leaving degraded mode");
                state.install_game_store(store).await;
                announce(&state, false);
                delay = INITIAL_DELAY;
            }
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}

fn announce(state: &SharedState, degraded: bool) {
    sse_events::broadcast_system_status(state, degraded);
    let message = if degraded {
        "storage unavailable, changes are rejected"
    } else {
        "storage available again"
    };
    sse_service::broadcast_public_info(state.public_sse(), message);
}
