//! Weiterleitungen an Report-Speicher und Metrik-Kontrolle

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use podium_core::collab::SessionSummary;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::error::SignalingError;
use crate::server_state::SignalingState;

pub async fn report_speichern(
    State(state): State<Arc<SignalingState>>,
    Json(summary): Json<SessionSummary>,
) -> Result<Response, SignalingError> {
    state
        .report_store
        .save_report(summary.clone())
        .await
        .map_err(SignalingError::from)?;

    info!(raum = %summary.room_id, teilnehmer = %summary.participant_id, "Report gespeichert");
    Ok((StatusCode::CREATED, Json(json!({ "saved": true }))).into_response())
}

pub async fn stats_abrufen(
    State(state): State<Arc<SignalingState>>,
) -> Result<Response, SignalingError> {
    let stats = state
        .report_store
        .load_stats()
        .await
        .map_err(SignalingError::from)?;
    Ok(Json(json!({ "stats": stats })).into_response())
}

pub async fn metrik_health(State(state): State<Arc<SignalingState>>) -> Response {
    let laeuft = state.metrics.is_alive().await;
    Json(json!({ "alive": laeuft })).into_response()
}

pub async fn metrik_starten(
    State(state): State<Arc<SignalingState>>,
) -> Result<Response, SignalingError> {
    state
        .metrics
        .start()
        .await
        .map_err(SignalingError::from)?;
    Ok(Json(json!({ "started": true })).into_response())
}

pub async fn metrik_stoppen(
    State(state): State<Arc<SignalingState>>,
) -> Result<Response, SignalingError> {
    state
        .metrics
        .stop()
        .await
        .map_err(SignalingError::from)?;
    Ok(Json(json!({ "stopped": true })).into_response())
}
