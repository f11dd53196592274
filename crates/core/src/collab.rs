//! Schnittstellen zu externen Mitspielern
//!
//! Der Signaling-Kern behandelt LLM-Feedback, Report-Persistenz und den
//! Metrik-/Visualisierungsprozess als opake Kollaborateure. Hier stehen
//! nur die Traits; die konkreten Implementierungen liefert das
//! Server-Crate beim Zusammenbau.
//!
//! Alle Aufrufe koennen langsam sein (Sekunden) und duerfen die
//! Signaling-Schleife niemals blockieren – Aufrufer muessen sie
//! ausserhalb gehaltener Raum-Sperren ausfuehren.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{ParticipantId, RoomId};

// ---------------------------------------------------------------------------
// Feedback-Generator (LLM)
// ---------------------------------------------------------------------------

/// Erzeugt natuerlichsprachliches Coaching aus einem Transkript oder
/// einer strukturierten Sitzungszusammenfassung
#[async_trait]
pub trait FeedbackGenerator: Send + Sync + 'static {
    /// Gibt Coaching-Text fuer die Eingabe zurueck
    async fn generate_feedback(&self, input: &str) -> Result<String>;
}

// ---------------------------------------------------------------------------
// Report-Store
// ---------------------------------------------------------------------------

/// Zusammenfassung einer abgeschlossenen Sprechsitzung eines Teilnehmers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub room_id: RoomId,
    pub participant_id: ParticipantId,
    pub participant_name: String,
    pub session_date: DateTime<Utc>,
    /// Genutzte Redezeit in Sekunden
    pub speaking_duration_secs: u32,
    pub feedback_count: u32,
    /// Gesamtscore 0..=100
    pub overall_score: u32,
}

/// Aggregierte Statistik ueber alle gespeicherten Reports
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateStats {
    pub total_sessions: u64,
    pub total_speaking_secs: u64,
    pub average_score: f64,
}

/// Dauerhafter Append-Only-Speicher fuer Sitzungszusammenfassungen
#[async_trait]
pub trait ReportStore: Send + Sync + 'static {
    /// Haengt eine Zusammenfassung an den Speicher an
    async fn save_report(&self, summary: SessionSummary) -> Result<()>;

    /// Laedt die aggregierte Statistik
    async fn load_stats(&self) -> Result<AggregateStats>;
}

// ---------------------------------------------------------------------------
// Metrik-/Visualisierungsdienst
// ---------------------------------------------------------------------------

/// Start/Stop/Liveness-Kontrolle ueber den unabhaengigen Metrik-Prozess
///
/// Der Kern kennt die Interna des Dienstes nicht; er reicht lediglich
/// Kontrollkommandos durch.
#[async_trait]
pub trait MetricsControl: Send + Sync + 'static {
    /// Startet den Metrik-Prozess (idempotent)
    async fn start(&self) -> Result<()>;

    /// Stoppt den Metrik-Prozess (idempotent)
    async fn stop(&self) -> Result<()>;

    /// Prueft ob der Prozess lebt
    async fn is_alive(&self) -> bool;
}
