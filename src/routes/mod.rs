use axum::Router;

use crate::state::SharedState;

pub mod admin;
pub mod docs;
pub mod health;
pub mod player;
pub mod public;
pub mod sse;

/// Every route tree, documentation included, bound to the shared state.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(sse::router())
        .merge(admin::router())
        .merge(player::router())
        .merge(public::router())
        .merge(docs::router())
        .with_state(state)
}
