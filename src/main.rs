//! Karma Suits Back binary entrypoint wiring REST, SSE and the lobby store.

use std::{env, net::SocketAddr};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use karma_suits_back::{
    config::AppConfig,
    dao::game_store,
    error::ServiceError,
    routes,
    services::{game_service, storage_supervisor},
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let store_config = config.store.clone();
    let app_state = AppState::new(config);

    let store = game_store::open(&store_config)
        .await
        .with_context(|| format!("opening lobby store {store_config:?}"))?;
    app_state.install_game_store(store).await;
    match game_service::restore_from_store(&app_state).await {
        Ok(Some(phase)) => info!(phase = ?phase, "resuming previous lobby"),
        Ok(None) => info!("starting with an empty lobby"),
        Err(ServiceError::Unavailable(err)) if !err.is_transient() => {
            return Err(anyhow::Error::new(err)
                .context("lobby snapshot cannot be decoded; refusing to overwrite it"));
        }
        Err(err) => warn!(error = %err, "failed to restore lobby; starting empty"),
    }

    tokio::spawn(storage_supervisor::run(app_state.clone(), move || {
        let store_config = store_config.clone();
        async move { game_store::open(&store_config).await }
    }));

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
