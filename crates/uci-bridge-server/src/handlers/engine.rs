//! `POST /move`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use uci_bridge::{SearchResult, SupervisorError};

use crate::AppState;
use crate::error::ApiError;
use crate::telemetry;
use crate::types::{MoveRequest, MoveResponse, NoMoveResponse};

/// `moves` の後の局面での最善手をエンジンに問い合わせる。
///
/// スーパーバイザは最大で movetime + margin だけブロックするので、blocking pool で呼ぶ。
pub async fn make_move(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<MoveRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    req.validate().map_err(ApiError::BadRequest)?;

    let source = Arc::clone(&state.source);
    let budget = Duration::from_millis(req.movetime);
    let plies = req.moves.len();
    let started = Instant::now();
    let outcome =
        tokio::task::spawn_blocking(move || source.compute_best_move(&req.moves, budget))
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?;
    metrics::histogram!(telemetry::SEARCH_SECONDS).record(started.elapsed().as_secs_f64());

    let result = outcome.inspect_err(record_failure)?;
    record_result(&result);
    tracing::info!(
        plies,
        movetime = budget.as_millis() as u64,
        bestmove = result.best_move.as_deref().unwrap_or("(none)"),
        eval = result.eval,
        "move computed"
    );

    Ok(match result.best_move {
        Some(bestmove) => Json(MoveResponse {
            success: true,
            bestmove,
            eval: result.eval,
            ponder: result.ponder,
            fallback: result.fallback,
        })
        .into_response(),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(NoMoveResponse {
                success: false,
                error: "Engine failed to calculate move".to_string(),
                eval: result.eval,
            }),
        )
            .into_response(),
    })
}

fn record_result(result: &SearchResult) {
    metrics::counter!(telemetry::SEARCHES_TOTAL).increment(1);
    if result.timed_out {
        metrics::counter!(telemetry::SEARCH_TIMEOUTS_TOTAL).increment(1);
    }
    if result.fallback {
        metrics::counter!(telemetry::FALLBACK_MOVES_TOTAL).increment(1);
    }
}

fn record_failure(err: &SupervisorError) {
    match err {
        SupervisorError::Busy => metrics::counter!(telemetry::BUSY_REJECTIONS_TOTAL).increment(1),
        _ => metrics::counter!(telemetry::SEARCH_FAILURES_TOTAL).increment(1),
    }
}
