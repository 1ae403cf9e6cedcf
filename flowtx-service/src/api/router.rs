use super::handlers::health::{handle_health, handle_metrics, handle_ready};
use super::state::ApiState;
use axum::routing::get;
use axum::Router;
use flowtx_core::foundation::FlowTxError;
use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;

pub async fn run_api_server(addr: SocketAddr, state: Arc<ApiState>, mut shutdown: watch::Receiver<bool>) -> Result<(), FlowTxError> {
    info!("binding http api addr={}", addr);
    let app = build_router(state);
    let listener = TcpListener::bind(addr).await.map_err(|err| FlowTxError::transport("api bind", err))?;
    info!("HTTP api ready and accepting connections addr={}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            while !*shutdown.borrow() {
                if shutdown.changed().await.is_err() {
                    break;
                }
            }
        })
        .await
        .map_err(|err| {
            error!("HTTP api terminated unexpectedly addr={} error={}", addr, err);
            FlowTxError::Message(err.to_string())
        })
}

pub fn build_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/ready", get(handle_ready))
        .route("/metrics", get(handle_metrics))
        .with_state(state)
}
