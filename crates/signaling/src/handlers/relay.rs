//! WebRTC-Signal-Relay – Offer, Answer, ICE-Kandidaten
//!
//! Das Relay adressiert nur um und leitet weiter: `from` wird immer
//! auf die serverseitig bekannte Absender-Identitaet gesetzt, die
//! Nutzlast selbst bleibt opak und wird weder geprueft noch behalten.
//! Unbekannte Nachrichtentypen fallen auf dasselbe Verhalten zurueck.

use podium_core::types::{ConnectionId, ParticipantId, RoomId};
use podium_protocol::client::SignalPayload;
use podium_protocol::event::Outbound;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::debug;

use crate::server_state::SignalingState;

/// Baut die Relay-Nachricht mit autoritativem `from` zusammen
fn relay_nachricht(typ: &str, absender: &ParticipantId, payload: SignalPayload) -> Value {
    let mut objekt = Map::new();
    objekt.insert("type".to_string(), json!(typ));
    objekt.insert("from".to_string(), json!(absender.as_str()));
    if let Some(ziel) = &payload.to {
        objekt.insert("to".to_string(), json!(ziel.as_str()));
    }
    for (key, wert) in payload.rest {
        // "from" aus dem Client wird verworfen, nie durchgereicht
        if key != "type" && key != "from" && key != "to" {
            objekt.insert(key, wert);
        }
    }
    Value::Object(objekt)
}

/// Leitet eine Signalnachricht an den Raum weiter (ohne den Absender)
pub fn signal_weiterleiten(
    state: &Arc<SignalingState>,
    room_id: &RoomId,
    connection_id: ConnectionId,
    absender: &ParticipantId,
    typ: &str,
    payload: SignalPayload,
) {
    if !state.rooms.enthaelt(room_id) {
        return;
    }

    let nachricht = Outbound::Raw(relay_nachricht(typ, absender, payload));
    let gesendet = state
        .registry
        .an_raum_senden(room_id, nachricht, Some(&connection_id));
    debug!(raum = %room_id, typ, von = %absender, gesendet, "Signal weitergeleitet");
}

/// Leitet eine unbekannte Nachricht unveraendert weiter (ohne Absender).
///
/// Generisches Relay als Standardverhalten: was weder Rotation noch
/// Feedback noch WebRTC ist, geht wortgleich an die anderen Kanaele.
pub fn unbekannt_weiterleiten(
    state: &Arc<SignalingState>,
    room_id: &RoomId,
    connection_id: ConnectionId,
    roh: Value,
) {
    if !state.rooms.enthaelt(room_id) {
        return;
    }

    let typ = roh
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("?")
        .to_string();
    state
        .registry
        .an_raum_senden(room_id, Outbound::Raw(roh), Some(&connection_id));
    debug!(raum = %room_id, typ, "Unbekannte Nachricht durchgereicht");
}
