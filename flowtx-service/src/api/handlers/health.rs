use super::super::state::ApiState;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{debug, trace};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
struct ReadyResponse {
    status: &'static str,
    lease_store: &'static str,
    lease_store_ok: bool,
}

pub async fn handle_health() -> impl IntoResponse {
    trace!("health check: ok");
    Json(serde_json::json!({
        "status": "healthy",
    }))
}

pub async fn handle_ready(State(state): State<Arc<ApiState>>) -> Response {
    let lease_store_ok = match state.lease_store.health_check().await {
        Ok(()) => true,
        Err(err) => {
            debug!("ready check: lease store unhealthy backend={} error={}", state.lease_store.backend_name(), err);
            false
        }
    };
    let body = ReadyResponse {
        status: if lease_store_ok { "ready" } else { "degraded" },
        lease_store: state.lease_store.backend_name(),
        lease_store_ok,
    };
    let status = if lease_store_ok { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(body)).into_response()
}

pub async fn handle_metrics(State(state): State<Arc<ApiState>>) -> Response {
    match state.metrics.encode() {
        Ok(body) => {
            let mut response = body.into_response();
            response.headers_mut().insert(axum::http::header::CONTENT_TYPE, HeaderValue::from_static("text/plain; version=0.0.4"));
            response
        }
        Err(err) => {
            debug!("metrics encode failed error={}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("metrics_error: {}", err)).into_response()
        }
    }
}
