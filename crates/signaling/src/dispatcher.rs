//! Message-Dispatcher – Routet Client-Nachrichten an die Handler
//!
//! Der Dispatcher bekommt geparste Nachrichten aus der
//! Verbindungsschleife, bestimmt den zustaendigen Handler und fuehrt
//! ihn aus. Er kennt die zugelassene Identitaet der Verbindung;
//! Absender-Felder in Nutzlasten sind nie autoritativ.

use podium_core::types::{ConnectionId, ParticipantId, RoomId};
use podium_protocol::client::{ClientMessage, Incoming};
use std::sync::Arc;
use tracing::debug;

use crate::handlers::{feedback, participant, relay, session};
use crate::server_state::SignalingState;

/// Dispatcher-Kontext – Identitaet der laufenden Verbindung
pub struct DispatcherContext {
    pub room_id: RoomId,
    pub connection_id: ConnectionId,
    pub participant_id: ParticipantId,
}

/// Zentraler Message-Dispatcher
pub struct MessageDispatcher {
    state: Arc<SignalingState>,
}

impl MessageDispatcher {
    /// Erstellt einen neuen Dispatcher
    pub fn neu(state: Arc<SignalingState>) -> Self {
        Self { state }
    }

    /// Verarbeitet eine eingehende Textnachricht.
    ///
    /// Unparsbare Nachrichten werden geloggt und verworfen; die
    /// Schleife verarbeitet die naechste Nachricht normal.
    pub fn dispatch_text(&self, text: &str, ctx: &DispatcherContext) {
        match Incoming::parse(text) {
            Ok(eingang) => self.dispatch(eingang, ctx),
            Err(err) => {
                debug!(raum = %ctx.room_id, fehler = %err, "Unparsbare Nachricht verworfen");
            }
        }
    }

    /// Routet eine geparste Nachricht an den zustaendigen Handler
    pub fn dispatch(&self, eingang: Incoming, ctx: &DispatcherContext) {
        let state = &self.state;
        match eingang {
            Incoming::Bekannt(nachricht) => match nachricht {
                ClientMessage::SetParticipantName { user_name, .. } => {
                    if let Some(name) = user_name {
                        participant::name_aktualisieren(
                            state,
                            &ctx.room_id,
                            &ctx.participant_id,
                            name,
                        );
                    }
                }
                ClientMessage::WebrtcOffer(payload) => relay::signal_weiterleiten(
                    state,
                    &ctx.room_id,
                    ctx.connection_id,
                    &ctx.participant_id,
                    "webrtc_offer",
                    payload,
                ),
                ClientMessage::WebrtcAnswer(payload) => relay::signal_weiterleiten(
                    state,
                    &ctx.room_id,
                    ctx.connection_id,
                    &ctx.participant_id,
                    "webrtc_answer",
                    payload,
                ),
                ClientMessage::WebrtcIceCandidate(payload) => relay::signal_weiterleiten(
                    state,
                    &ctx.room_id,
                    ctx.connection_id,
                    &ctx.participant_id,
                    "webrtc_ice_candidate",
                    payload,
                ),
                ClientMessage::StartSession => session::sitzung_starten(state, &ctx.room_id),
                ClientMessage::PreparationComplete => {
                    session::vorbereitung_abgeschlossen(state, &ctx.room_id)
                }
                ClientMessage::SpeakerFinished { participant_id } => session::sprecher_fertig(
                    state,
                    &ctx.room_id,
                    participant_id,
                    &ctx.participant_id,
                ),
                ClientMessage::NextSpeaker => session::naechster_sprecher(state, &ctx.room_id),
                ClientMessage::SendFeedback(payload) => {
                    feedback::feedback_senden(state, &ctx.room_id, &ctx.participant_id, payload)
                }
                ClientMessage::ToggleCamera { enabled } => participant::geraet_umschalten(
                    state,
                    &ctx.room_id,
                    &ctx.participant_id,
                    participant::Geraet::Kamera,
                    enabled,
                ),
                ClientMessage::ToggleMic { enabled } => participant::geraet_umschalten(
                    state,
                    &ctx.room_id,
                    &ctx.participant_id,
                    participant::Geraet::Mikrofon,
                    enabled,
                ),
            },
            // Generisches Relay als Standard fuer unbekannte Typen
            Incoming::Unbekannt(roh) => {
                relay::unbekannt_weiterleiten(state, &ctx.room_id, ctx.connection_id, roh)
            }
        }
    }
}
