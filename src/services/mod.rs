/// Facilitator operations: lifecycle, dashboards and overrides.
pub mod admin_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Lifecycle helpers shared by several services.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Player self-service operations.
pub mod player_service;
/// Public service for read-only game information.
pub mod public_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Storage health polling and degraded-mode switching.
pub mod storage_supervisor;
