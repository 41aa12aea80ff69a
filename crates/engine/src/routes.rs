use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use reflectgate_common::api::gate::{AskRequest, AskResponse, ReflectionResponse, ReflectionSubmit};

use crate::AppState;

/// POST /reflect: submit a reflection, receive the access decision.
pub async fn reflect_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReflectionSubmit>,
) -> Json<ReflectionResponse> {
    let start = std::time::Instant::now();

    let outcome = state.gate.submit_reflection(&request).await;

    metrics::histogram!("gate.request.latency", "route" => "reflect")
        .record(start.elapsed().as_secs_f64());

    Json(outcome.to_response())
}

/// POST /ask: one Socratic turn at an already-granted tier.
pub async fn ask_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AskRequest>,
) -> Json<AskResponse> {
    let start = std::time::Instant::now();

    let exchange = state.gate.ask(&request).await;

    metrics::histogram!("gate.request.latency", "route" => "ask")
        .record(start.elapsed().as_secs_f64());

    Json(AskResponse::from(&exchange))
}
