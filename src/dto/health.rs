use serde::Serialize;
use utoipa::ToSchema;

use crate::dto::phase::VisibleGamePhase;

/// Overall backend status.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Storage answered its probe.
    Ok,
    /// No store installed or the probe failed; writes are rejected.
    Degraded,
}

/// Body of the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatus,
    /// Lifecycle phase as shown to clients.
    pub phase: VisibleGamePhase,
    pub registered_players: usize,
    pub online_players: usize,
    pub sse_subscribers: usize,
}

impl HealthResponse {
    /// Whether the backend accepts writes.
    pub fn is_ok(&self) -> bool {
        self.status == HealthStatus::Ok
    }
}
