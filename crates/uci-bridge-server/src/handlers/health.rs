//! サービス情報・ヘルスチェック・エンジン情報のエンドポイント。

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::AppState;
use crate::types::{HealthResponse, InfoResponse, RootResponse};

/// サービス情報。
pub async fn root(State(state): State<Arc<AppState>>) -> Json<RootResponse> {
    let identity = state.source.identity();
    let status = if state.source.is_alive() { "online" } else { "degraded" };
    Json(RootResponse {
        engine: identity.name.unwrap_or_else(|| "unknown".to_string()),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: status.to_string(),
        endpoints: vec!["/move".to_string(), "/info".to_string(), "/health".to_string()],
    })
}

/// ヘルスチェック。エンジンプロセスが落ちていれば 503。
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let alive = state.source.is_alive();
    let (code, status) = if alive {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };
    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            engine_alive: alive,
        }),
    )
}

/// ハンドシェイクで得たエンジン情報。
pub async fn engine_info(State(state): State<Arc<AppState>>) -> Json<InfoResponse> {
    let identity = state.source.identity();
    Json(InfoResponse {
        name: identity.name,
        author: identity.author,
        protocol: "UCI".to_string(),
        started_at: state.started_at.to_rfc3339(),
    })
}
