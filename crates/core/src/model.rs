//! Domain-Modell: Raum, Teilnehmer, Feedback
//!
//! Der `Room` ist der autoritative In-Memory-Datensatz pro Raum und
//! zugleich der Snapshot der in Broadcast-Events eingebettet wird.
//! Persistenz ueber Prozess-Neustarts hinweg gibt es bewusst nicht.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ParticipantId, RoomId, RoomStatus};

// ---------------------------------------------------------------------------
// Teilnehmer
// ---------------------------------------------------------------------------

/// Ein zugelassenes Mitglied eines Raums
///
/// Wird beim Admit erstellt und beim Verbindungsende geloescht –
/// `participants` ist eine lebende Mitgliederliste, kein Verlauf.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub display_name: String,
    pub camera_enabled: bool,
    pub mic_enabled: bool,
    /// True genau fuer den ersten jemals zugelassenen Teilnehmer
    pub is_host: bool,
    /// Wird von der Sitzungs-State-Machine gesetzt
    pub has_spoken: bool,
    pub joined_at: DateTime<Utc>,
}

impl Participant {
    /// Erstellt einen neuen Teilnehmer mit Standard-Geraetestatus
    pub fn neu(id: ParticipantId, display_name: impl Into<String>, is_host: bool) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            camera_enabled: true,
            mic_enabled: true,
            is_host,
            has_spoken: false,
            joined_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Feedback
// ---------------------------------------------------------------------------

/// Art eines Peer-Feedbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackType {
    Positive,
    Constructive,
    Question,
}

/// Ein strukturiertes Feedback-Ereignis waehrend einer Sitzung
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub id: String,
    pub from_participant: ParticipantId,
    pub from_name: String,
    pub to_participant: ParticipantId,
    pub message: String,
    #[serde(rename = "type")]
    pub feedback_type: FeedbackType,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Raum
// ---------------------------------------------------------------------------

/// Unveraenderliche Raum-Konfiguration (bei Erstellung gesetzt)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    pub name: String,
    pub topic: String,
    /// Redezeit pro Sprecher in Minuten
    pub time_per_speaker: u32,
    pub max_participants: usize,
    pub is_public: bool,
    #[serde(default)]
    pub description: String,
    pub host_name: String,
}

/// Autoritativer In-Memory-Datensatz eines Raums
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub topic: String,
    pub time_per_speaker: u32,
    pub max_participants: usize,
    pub is_public: bool,
    pub description: String,
    pub host_name: String,
    pub created_at: DateTime<Utc>,
    pub status: RoomStatus,
    pub participants: Vec<Participant>,
    /// Einmalig bei Sitzungsstart berechnete Rotation; danach bis zum
    /// Abschluss unveraenderlich (Teilnehmer die gehen bleiben als
    /// Geister-Eintraege enthalten)
    pub speaking_order: Vec<ParticipantId>,
    pub current_speaker: Option<ParticipantId>,
    /// Vorbereitungszeit in Sekunden, bei Sitzungsstart gesetzt
    #[serde(default)]
    pub preparation_time: u32,
    #[serde(default)]
    pub feedback_log: Vec<Feedback>,
}

impl Room {
    /// Erstellt einen neuen Raum im Zustand `waiting`
    pub fn neu(id: RoomId, config: RoomConfig) -> Self {
        Self {
            id,
            name: config.name,
            topic: config.topic,
            time_per_speaker: config.time_per_speaker,
            max_participants: config.max_participants,
            is_public: config.is_public,
            description: config.description,
            host_name: config.host_name,
            created_at: Utc::now(),
            status: RoomStatus::Waiting,
            participants: Vec::new(),
            speaking_order: Vec::new(),
            current_speaker: None,
            preparation_time: 0,
            feedback_log: Vec::new(),
        }
    }

    /// Prueft ob die konfigurierte Kapazitaet erreicht ist
    pub fn ist_voll(&self) -> bool {
        self.participants.len() >= self.max_participants
    }

    /// Sucht einen Teilnehmer nach ID
    pub fn teilnehmer(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == id)
    }

    /// Sucht einen Teilnehmer nach ID (mutierbar)
    pub fn teilnehmer_mut(&mut self, id: &ParticipantId) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| &p.id == id)
    }

    /// Prueft die Invarianten des Raums
    ///
    /// `participants.len() <= max_participants` und `current_speaker`
    /// (falls gesetzt) ist Mitglied von `speaking_order`.
    pub fn invarianten_halten(&self) -> bool {
        if self.participants.len() > self.max_participants {
            return false;
        }
        match &self.current_speaker {
            Some(sprecher) => self.speaking_order.contains(sprecher),
            None => true,
        }
    }
}
