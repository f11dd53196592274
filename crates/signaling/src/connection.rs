//! Client-Connection – Verwaltet eine einzelne WebSocket-Verbindung
//!
//! Jede Verbindung laeuft in einem eigenen tokio-Task. Ablauf:
//!
//! ```text
//! Raum pruefen -> Kanal unter dem Limit registrieren
//!     -> erste Nachricht liefert die Identitaet -> Zulassung
//!     -> Nachrichtenschleife -> Aufraeumen
//! ```
//!
//! Der Aufraeumpfad laeuft bei jedem Schleifenende genau einmal,
//! unabhaengig davon ob der Client sauber getrennt hat oder die
//! Verbindung mitten in einer Nachricht gerissen ist. Jeder
//! Aufraeumschritt ist best-effort und blockiert die uebrigen nicht.

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use podium_core::types::{ConnectionId, RoomId};
use podium_protocol::client::{ClientMessage, Incoming};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::dispatcher::{DispatcherContext, MessageDispatcher};
use crate::error::SignalingError;
use crate::handlers::participant;
use crate::server_state::SignalingState;

/// Close-Code: Verbindungslimit des Raums erreicht
pub const CLOSE_VERBINDUNGS_LIMIT: u16 = 4001;
/// Close-Code: Raum hat seine konfigurierte Kapazitaet erreicht
pub const CLOSE_RAUM_VOLL: u16 = 4003;
/// Close-Code: Raum existiert nicht
pub const CLOSE_RAUM_NICHT_GEFUNDEN: u16 = 4004;

/// Verarbeitet eine WebSocket-Verbindung bis zum Ende ihrer Lebenszeit
pub async fn websocket_verarbeiten(
    state: Arc<SignalingState>,
    socket: WebSocket,
    room_id: RoomId,
    peer_addr: SocketAddr,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    if !state.rooms.enthaelt(&room_id) {
        warn!(raum = %room_id, peer = %peer_addr, "Verbindung zu unbekanntem Raum");
        schliessen(&mut ws_tx, CLOSE_RAUM_NICHT_GEFUNDEN, "room not found").await;
        return;
    }

    // Anti-Missbrauch-Limit, unabhaengig von max_participants. Die
    // Registry prueft und reserviert den Platz in einem Schritt.
    let connection_id = ConnectionId::neu();
    let Some(mut empfang) = state.registry.registrieren(
        &room_id,
        connection_id,
        state.config.verbindungs_limit_pro_raum,
    ) else {
        warn!(raum = %room_id, peer = %peer_addr, "Verbindungslimit erreicht");
        schliessen(&mut ws_tx, CLOSE_VERBINDUNGS_LIMIT, "connection limit reached").await;
        return;
    };

    info!(raum = %room_id, verbindung = %connection_id, peer = %peer_addr, "Neue Verbindung");

    // Die erste Nachricht traegt die gewuenschte Identitaet. Alles
    // andere wird nach der Zulassung als Gast normal dispatcht.
    let mut nachzuholen: Option<String> = None;
    let (user_id, user_name) = match ws_rx.next().await {
        Some(Ok(Message::Text(text))) => match Incoming::parse(&text) {
            Ok(Incoming::Bekannt(ClientMessage::SetParticipantName { user_id, user_name })) => {
                (user_id, user_name)
            }
            _ => {
                nachzuholen = Some(text);
                (None, None)
            }
        },
        Some(Ok(Message::Close(_))) | None => {
            state.registry.entfernen(&room_id, &connection_id);
            return;
        }
        Some(Ok(_)) => (None, None),
        Some(Err(err)) => {
            debug!(raum = %room_id, fehler = %err, "Lesefehler vor Zulassung");
            state.registry.entfernen(&room_id, &connection_id);
            return;
        }
    };

    let zulassung = match participant::zulassen(
        &state,
        &room_id,
        connection_id,
        user_id,
        user_name,
    ) {
        Ok(z) => z,
        Err(err) => {
            let (code, grund) = match err {
                SignalingError::RaumVoll(_) => (CLOSE_RAUM_VOLL, "room full"),
                _ => (CLOSE_RAUM_NICHT_GEFUNDEN, "room not found"),
            };
            warn!(raum = %room_id, peer = %peer_addr, fehler = %err, "Zulassung abgelehnt");
            state.registry.entfernen(&room_id, &connection_id);
            schliessen(&mut ws_tx, code, grund).await;
            return;
        }
    };

    // Zulassungs-Key: Netzwerk-Ursprung plus kurzes Identitaets-Praefix.
    // Haengt derselbe Ursprung mit derselben Identitaet noch an einem
    // alten Kanal, wird dieser verdraengt; sein Task raeumt sich selbst
    // auf, laesst den Teilnehmer aber stehen.
    let key = format!("{}:{}", peer_addr.ip(), zulassung.participant_id.prefix(8));
    if let Some(verdraengt) = state
        .registry
        .zulassungs_key_setzen(&room_id, key, connection_id)
    {
        info!(
            raum = %room_id,
            verbindung = %verdraengt,
            peer = %peer_addr,
            "Alter Kanal desselben Ursprungs verdraengt"
        );
        state.registry.entfernen(&room_id, &verdraengt);
    }

    let dispatcher = MessageDispatcher::neu(Arc::clone(&state));
    let ctx = DispatcherContext {
        room_id: room_id.clone(),
        connection_id,
        participant_id: zulassung.participant_id.clone(),
    };

    if let Some(text) = nachzuholen {
        dispatcher.dispatch_text(&text, &ctx);
    }

    loop {
        tokio::select! {
            // Broadcast-Queue -> WebSocket
            ausgehend = empfang.recv() => {
                match ausgehend {
                    Some(nachricht) => {
                        if let Err(err) = ws_tx.send(Message::Text(nachricht.als_text())).await {
                            debug!(raum = %room_id, fehler = %err, "Senden fehlgeschlagen");
                            break;
                        }
                    }
                    // Registry hat den Kanal entfernt
                    None => break,
                }
            }

            // Eingehende Nachricht vom Client
            eingang = ws_rx.next() => {
                match eingang {
                    Some(Ok(Message::Text(text))) => {
                        dispatcher.dispatch_text(&text, &ctx);
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!(raum = %room_id, verbindung = %connection_id, "Client hat getrennt");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        debug!(raum = %room_id, fehler = %err, "Lesefehler");
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    // Aufraeumen: Teilnehmer, Kanal, leerer Raum. Genau einmal, jeder
    // Schritt unabhaengig vom Erfolg der anderen. Traegt ein anderer
    // lebender Kanal dieselbe Identitaet (Verdraengung durch einen
    // Re-Join), bleibt der Teilnehmer erhalten.
    if !state
        .registry
        .identitaet_anderweitig_verbunden(&connection_id, &zulassung.participant_id)
    {
        participant::entfernen(&state, &room_id, &zulassung.participant_id);
    }
    state.registry.entfernen(&room_id, &connection_id);
    state.rooms.entfernen_wenn_leer(&room_id);
}

async fn schliessen(ws_tx: &mut SplitSink<WebSocket, Message>, code: u16, grund: &'static str) {
    let frame = CloseFrame {
        code,
        reason: grund.into(),
    };
    if ws_tx.send(Message::Close(Some(frame))).await.is_err() {
        debug!(code, "Close-Frame nicht zustellbar");
    }
}
