//! Gemeinsame Identifikationstypen fuer Podium
//!
//! Alle IDs verwenden das Newtype-Pattern um Verwechslungen zwischen
//! verschiedenen ID-Arten zur Compilezeit auszuschliessen.

use rand::{distr::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Laenge des Raum-Codes
const RAUM_CODE_LAENGE: usize = 6;

/// Kurzer, eindeutiger Raum-Code (z.B. "K7KQ2F")
///
/// Wird bei der Raum-Erstellung einmalig generiert und ist danach
/// unveraenderlich.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Generiert einen neuen zufaelligen Raum-Code
    pub fn generieren() -> Self {
        let code: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(RAUM_CODE_LAENGE)
            .map(|b| (b as char).to_ascii_uppercase())
            .collect();
        Self(code)
    }

    /// Gibt den Code als &str zurueck
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RoomId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "raum:{}", self.0)
    }
}

/// Eindeutige Teilnehmer-ID innerhalb eines Raums
///
/// Eine vom Client mitgelieferte Identitaet wird uebernommen sofern sie
/// im Raum noch nicht vergeben ist; andernfalls wird serverseitig eine
/// UUID-basierte ID erzeugt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    /// Erzeugt eine neue serverseitige Teilnehmer-ID
    pub fn neu() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Gibt die ID als &str zurueck
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Gibt die ersten `n` Zeichen der ID zurueck (fuer Verbindungs-Keys)
    pub fn prefix(&self, n: usize) -> String {
        self.0.chars().take(n).collect()
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "teilnehmer:{}", self.0)
    }
}

/// Eindeutige ID einer einzelnen WebSocket-Verbindung
///
/// Ein logischer Teilnehmer besitzt zu jedem Zeitpunkt hoechstens eine
/// lebende Verbindung; die ConnectionId identifiziert den Kanal selbst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Erstellt eine neue zufaellige ConnectionId
    pub fn neu() -> Self {
        Self(Uuid::new_v4())
    }

    /// Gibt die innere UUID zurueck
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::neu()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "verbindung:{}", self.0)
    }
}

/// Status eines Raums
///
/// Wird ausschliesslich von der Sitzungs-State-Machine mutiert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    /// Teilnehmer sammeln sich, Sitzung noch nicht gestartet
    Waiting,
    /// Sitzung gestartet, Sprechreihenfolge steht fest
    Active,
    /// Vorbereitungsphase des aktuellen Sprechers
    Preparing,
    /// Ein Teilnehmer spricht
    Speaking,
    /// Rotation abgeschlossen (Terminalzustand)
    Completed,
}

impl std::fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Waiting => "waiting",
            Self::Active => "active",
            Self::Preparing => "preparing",
            Self::Speaking => "speaking",
            Self::Completed => "completed",
        };
        write!(f, "{s}")
    }
}
