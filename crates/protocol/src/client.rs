//! Eingehende Client-Nachrichten auf dem Raum-Kanal
//!
//! ## Design
//! - JSON-Serialisierung via serde (WebSocket-Text, nicht zeitkritisch)
//! - Tagged Enum (`type`-Feld) fuer typsichere Nachrichtentypen
//! - Unbekannte Typen fallen in `Incoming::Unbekannt` und werden vom
//!   Relay unveraendert an den Raum weitergeleitet (generischer
//!   Weiterleitungs-Default)

use podium_core::model::FeedbackType;
use podium_core::types::ParticipantId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Signal-Payload (WebRTC)
// ---------------------------------------------------------------------------

/// Opakes Verhandlungs-Payload eines WebRTC-Signals
///
/// Der Relay interpretiert den Inhalt nicht: `to` steuert nur die
/// Adressierung (None = Broadcast an den Raum), alle uebrigen Felder
/// werden unveraendert durchgereicht. Ein vom Client mitgesendetes
/// `from` wird serverseitig ueberschrieben und niemals vertraut.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalPayload {
    /// Ziel-Teilnehmer; None bedeutet Broadcast an den ganzen Raum
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<ParticipantId>,
    /// Restliche Felder des Signals (SDP, Candidate, ...)
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Feedback-Payload
// ---------------------------------------------------------------------------

/// Client-seitiger Anteil eines Feedback-Ereignisses
///
/// Absender-Identitaet und Zeitstempel setzt der Server autoritativ.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackPayload {
    pub to_participant: ParticipantId,
    pub message: String,
    #[serde(rename = "type", default = "FeedbackPayload::standard_typ")]
    pub feedback_type: FeedbackType,
}

impl FeedbackPayload {
    fn standard_typ() -> FeedbackType {
        FeedbackType::Constructive
    }
}

// ---------------------------------------------------------------------------
// Haupt-Enum: ClientMessage
// ---------------------------------------------------------------------------

/// Alle erkannten Nachrichten auf dem Raum-Kanal (typsicher via Tagged Enum)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Identitaets-Anmeldung; als erste Nachricht bestimmt sie die vom
    /// Client gewuenschte Identitaet
    SetParticipantName {
        #[serde(default)]
        user_id: Option<String>,
        #[serde(default)]
        user_name: Option<String>,
    },

    // --- Signaling-Relay ---
    WebrtcOffer(SignalPayload),
    WebrtcAnswer(SignalPayload),
    WebrtcIceCandidate(SignalPayload),

    // --- Sitzungs-State-Machine ---
    StartSession,
    PreparationComplete,
    SpeakerFinished {
        /// Expliziter Sprecher; None faellt auf `current_speaker` zurueck
        #[serde(default)]
        participant_id: Option<ParticipantId>,
    },
    NextSpeaker,

    // --- Feedback-Fan-out ---
    SendFeedback(FeedbackPayload),

    // --- Teilnehmer-Lifecycle ---
    ToggleCamera { enabled: bool },
    ToggleMic { enabled: bool },
}

/// Eingehender Frame: erkannte Nachricht oder unbekannter Typ
///
/// Unbekannte Typen behalten ihr rohes JSON und werden vom Dispatcher
/// wortgleich an den Raum weitergeleitet (Absender ausgeschlossen).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Incoming {
    Bekannt(ClientMessage),
    Unbekannt(Value),
}

impl Incoming {
    /// Parst einen rohen Text-Frame
    ///
    /// Fehlerfall: unparsebares JSON. Aufrufer loggen und verwerfen,
    /// die Verbindungsschleife laeuft weiter.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
