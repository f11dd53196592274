//! REST-Handler fuer Raum-Endpunkte

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use podium_core::model::RoomConfig;
use podium_core::types::RoomId;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::error::SignalingError;
use crate::server_state::SignalingState;

#[derive(Debug, Deserialize)]
pub struct RaumErstellenBody {
    pub name: String,
    pub topic: String,
    #[serde(default = "standard_redezeit")]
    pub time_per_speaker: u32,
    #[serde(default = "standard_kapazitaet")]
    pub max_participants: usize,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub description: String,
    pub host_name: String,
}

fn standard_redezeit() -> u32 {
    5
}

fn standard_kapazitaet() -> usize {
    6
}

pub async fn raum_erstellen(
    State(state): State<Arc<SignalingState>>,
    Json(body): Json<RaumErstellenBody>,
) -> Result<Response, SignalingError> {
    if body.name.trim().is_empty() || body.host_name.trim().is_empty() {
        return Err(SignalingError::UngueltigeEingabe(
            "name und host_name duerfen nicht leer sein".to_string(),
        ));
    }

    let raum = state.rooms.erstellen(RoomConfig {
        name: body.name,
        topic: body.topic,
        time_per_speaker: body.time_per_speaker,
        max_participants: body.max_participants.clamp(2, 10),
        is_public: body.is_public,
        description: body.description,
        host_name: body.host_name,
    });

    info!(raum = %raum.id, name = %raum.name, "Raum erstellt");
    Ok((StatusCode::CREATED, Json(json!({ "room": raum }))).into_response())
}

pub async fn raeume_auflisten(State(state): State<Arc<SignalingState>>) -> Response {
    let raeume = state.rooms.oeffentliche_raeume();
    Json(json!({ "rooms": raeume })).into_response()
}

pub async fn raum_abrufen(
    State(state): State<Arc<SignalingState>>,
    Path(id): Path<String>,
) -> Result<Response, SignalingError> {
    let room_id = RoomId::from(id);
    let raum = state
        .rooms
        .snapshot(&room_id)
        .ok_or_else(|| SignalingError::RaumNichtGefunden(room_id.to_string()))?;
    Ok(Json(json!({ "room": raum })).into_response())
}

/// Vor-Pruefung fuer Clients: existiert der Raum und ist Platz frei
pub async fn beitritt_pruefen(
    State(state): State<Arc<SignalingState>>,
    Path(id): Path<String>,
) -> Result<Response, SignalingError> {
    let room_id = RoomId::from(id);
    let raum = state
        .rooms
        .snapshot(&room_id)
        .ok_or_else(|| SignalingError::RaumNichtGefunden(room_id.to_string()))?;

    let verbindungen = state.registry.verbindungs_anzahl(&room_id);
    let beitritt_moeglich = !raum.ist_voll()
        && verbindungen < state.config.verbindungs_limit_pro_raum;

    Ok(Json(json!({
        "room_id": room_id,
        "can_join": beitritt_moeglich,
        "participants": raum.participants.len(),
        "max_participants": raum.max_participants,
        "status": raum.status,
    }))
    .into_response())
}

pub async fn health(State(state): State<Arc<SignalingState>>) -> Response {
    Json(json!({
        "status": "ok",
        "uptime_secs": state.uptime_sek(),
        "rooms": state.rooms.anzahl(),
    }))
    .into_response()
}
