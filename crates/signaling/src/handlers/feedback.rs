//! Feedback-Fan-out – Peer-Feedback sammeln und an alle verteilen
//!
//! Anders als das Signal-Relay geht Feedback auch an den Absender
//! zurueck, als Echo-Bestaetigung. Jeder Eintrag landet zusaetzlich im
//! Feedback-Log des Raums.

use chrono::Utc;
use podium_core::model::Feedback;
use podium_core::types::{ParticipantId, RoomId};
use podium_protocol::client::FeedbackPayload;
use podium_protocol::event::ServerEvent;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::server_state::SignalingState;

/// Haengt das Feedback an das Raum-Log an und verteilt es an alle
/// Kanaele einschliesslich des Absenders.
pub fn feedback_senden(
    state: &Arc<SignalingState>,
    room_id: &RoomId,
    absender: &ParticipantId,
    payload: FeedbackPayload,
) {
    let Some(raum_arc) = state.rooms.get(room_id) else {
        return;
    };

    let mut raum = raum_arc.lock();
    let absender_name = raum
        .teilnehmer(absender)
        .map(|p| p.display_name.clone())
        .unwrap_or_else(|| absender.to_string());

    let eintrag = Feedback {
        id: Uuid::new_v4().simple().to_string(),
        from_participant: absender.clone(),
        from_name: absender_name,
        to_participant: payload.to_participant,
        message: payload.message,
        feedback_type: payload.feedback_type,
        timestamp: Utc::now(),
    };
    raum.feedback_log.push(eintrag.clone());

    let raum_snapshot = raum.clone();
    state.registry.an_raum_senden(
        room_id,
        ServerEvent::SendFeedback {
            room: raum_snapshot,
            feedback: eintrag.clone(),
        }
        .into(),
        None,
    );
    drop(raum);

    info!(
        raum = %room_id,
        von = %absender,
        an = %eintrag.to_participant,
        "Feedback verteilt"
    );
}
