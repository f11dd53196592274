//! Ausgehende Server-Events auf dem Raum-Kanal
//!
//! Broadcast-Umschlag: `{"type": string, "room": <Snapshot>?, ...}`.
//! Die meisten Events tragen den vollstaendigen Raum-Snapshot, damit
//! Clients ihren Zustand ohne Delta-Logik ersetzen koennen.

use podium_core::model::{Feedback, Participant, Room};
use podium_core::types::ParticipantId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Alle typisierten Events die der Server an Raum-Kanaele sendet
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Vollstaendiger Raum-Snapshot plus zugewiesene Identitaet – geht
    /// gezielt an den frisch zugelassenen Kanal
    RoomState {
        room: Room,
        participant_id: ParticipantId,
    },

    /// Neuer Teilnehmer – geht an alle anderen Kanaele des Raums
    ParticipantJoined {
        room: Room,
        participant: Participant,
    },

    /// Name oder Geraetestatus eines Teilnehmers hat sich geaendert
    ParticipantUpdated {
        room: Room,
        participant: Participant,
    },

    /// Teilnehmer hat den Raum verlassen
    ParticipantDisconnected {
        room: Room,
        participant_id: ParticipantId,
    },

    /// Sitzung gestartet, Sprechreihenfolge steht fest
    SessionStarted { room: Room },

    /// Vorbereitungsphase beendet, aktueller Sprecher beginnt
    SpeakingStarted {
        room: Room,
        current_speaker: Option<ParticipantId>,
    },

    /// Rotation ist zum naechsten Sprecher weitergerueckt
    SpeakerChanged {
        room: Room,
        current_speaker: Option<ParticipantId>,
    },

    /// Letzter Sprecher fertig, Rotation abgeschlossen
    SessionCompleted { room: Room },

    /// Peer-Feedback – geht an alle Kanaele inklusive Absender
    SendFeedback { room: Room, feedback: Feedback },
}

/// Nachricht in der Send-Queue eines Kanals
///
/// Entweder ein typisiertes Server-Event oder rohes JSON das der Relay
/// wortgleich weiterreicht (WebRTC-Signale, unbekannte Typen).
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Outbound {
    Event(ServerEvent),
    Raw(Value),
}

impl Outbound {
    /// Serialisiert fuer den WebSocket-Text-Frame
    pub fn als_text(&self) -> String {
        // Serialisierung der eigenen Typen kann nicht fehlschlagen
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

impl From<ServerEvent> for Outbound {
    fn from(event: ServerEvent) -> Self {
        Self::Event(event)
    }
}

impl From<Value> for Outbound {
    fn from(wert: Value) -> Self {
        Self::Raw(wert)
    }
}
