//! Router assembly and server lifecycle.

use std::{future::Future, io, net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use metrics_exporter_prometheus::BuildError;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::RelayConfig, infrastructure::metrics::install_recorder,
    usecase::DisconnectClientUseCase,
};

use super::{
    handler::{
        get_metrics, get_room_detail, get_rooms, get_stats, health_check, publish_message,
        websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },

    #[error("failed to install metrics recorder: {0}")]
    Metrics(#[from] BuildError),

    #[error("server error: {0}")]
    Serve(#[from] io::Error),
}

/// Build the relay's routes on top of `state`.
///
/// Only the read-only inspection routes carry CORS. Ingestion and `/metrics`
/// are for trusted internal callers, and `/ws` checks `Origin` itself.
pub fn build_router(state: Arc<AppState>) -> Router {
    let inspection = Router::new()
        .route("/api/health", get(health_check))
        .route("/api/rooms", get(get_rooms))
        .route("/api/rooms/{room_key}", get(get_room_detail))
        .route("/api/stats", get(get_stats))
        .layer(cors_layer(&state.config));

    Router::new()
        .route("/ws", get(websocket_handler))
        .route("/api/messages", post(publish_message))
        .route("/metrics", get(get_metrics))
        .merge(inspection)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &RelayConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    if config.allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.trim_end_matches('/').parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring unparseable allowed origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

/// Bind the configured address and serve until Ctrl+C or SIGTERM.
pub async fn run(config: RelayConfig) -> Result<(), ServerError> {
    let addr = config.addr;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    let metrics = install_recorder()?;
    serve(listener, AppState::new(config, metrics), shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` resolves.
///
/// On shutdown every registered connection is torn down before in-flight HTTP
/// requests are drained.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = Arc::new(state);
    let app = build_router(state.clone());

    tracing::info!("Realtime relay listening on {}", listener.local_addr()?);
    tracing::info!("WebSocket endpoint: /ws");
    tracing::info!("Ingestion endpoint: POST /api/messages");

    let disconnect = DisconnectClientUseCase::new(state.registry.clone());
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            disconnect.disconnect_all().await;
        })
        .await?;

    tracing::info!("Realtime relay stopped");
    Ok(())
}
