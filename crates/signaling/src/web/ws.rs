//! WebSocket-Upgrades – Signaling-Kanal und Coaching-Kanal

use axum::extract::connect_info::ConnectInfo;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use podium_core::types::RoomId;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info};

use crate::connection::websocket_verarbeiten;
use crate::server_state::SignalingState;

/// Antwortzeile wenn der Feedback-Generator nicht erreichbar ist
const COACH_FALLBACK: &str =
    "Gut gemacht! Achte beim naechsten Mal auf dein Sprechtempo und halte Blickkontakt.";

/// Upgrade auf den Signaling-Kanal eines Raums
///
/// Raum- und Limit-Pruefung passieren erst nach dem Upgrade, damit der
/// Client einen aussagekraeftigen Close-Code bekommt.
pub async fn signaling_upgrade(
    ws: WebSocketUpgrade,
    Path(room_id): Path<String>,
    ConnectInfo(peer_addr): ConnectInfo<SocketAddr>,
    State(state): State<Arc<SignalingState>>,
) -> Response {
    let room_id = RoomId::from(room_id);
    ws.on_upgrade(move |socket| websocket_verarbeiten(state, socket, room_id, peer_addr))
}

/// Upgrade auf den Coaching-Kanal
///
/// Nimmt Transkript-Text entgegen, laesst den Feedback-Generator
/// antworten und schickt die Coaching-Zeile zurueck. Generator-Fehler
/// antworten mit einer festen Ersatzzeile statt die Verbindung zu
/// beenden.
pub async fn coach_upgrade(
    ws: WebSocketUpgrade,
    ConnectInfo(peer_addr): ConnectInfo<SocketAddr>,
    State(state): State<Arc<SignalingState>>,
) -> Response {
    ws.on_upgrade(move |socket| coach_verarbeiten(state, socket, peer_addr))
}

async fn coach_verarbeiten(state: Arc<SignalingState>, mut socket: WebSocket, peer_addr: SocketAddr) {
    info!(peer = %peer_addr, "Coaching-Verbindung geoeffnet");

    while let Some(Ok(nachricht)) = socket.recv().await {
        let Message::Text(text) = nachricht else {
            if matches!(nachricht, Message::Close(_)) {
                break;
            }
            continue;
        };

        // Entweder {"transcript": "..."} oder roher Text
        let transkript = match serde_json::from_str::<Value>(&text) {
            Ok(wert) => wert
                .get("transcript")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or(text),
            Err(_) => text,
        };

        let antwort = match state.feedback_generator.generate_feedback(&transkript).await {
            Ok(feedback) => feedback,
            Err(err) => {
                debug!(peer = %peer_addr, fehler = %err, "Feedback-Generator nicht erreichbar");
                COACH_FALLBACK.to_string()
            }
        };

        let ausgehend = json!({ "type": "coach_feedback", "text": antwort }).to_string();
        if socket.send(Message::Text(ausgehend)).await.is_err() {
            break;
        }
    }

    info!(peer = %peer_addr, "Coaching-Verbindung geschlossen");
}
