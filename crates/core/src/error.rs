//! Fehlertypen fuer Podium
//!
//! Zentraler Fehler-Enum der alle moeglichen Fehlerzustaende abdeckt.
//! Untermodule koennen eigene Fehler definieren und via `#[from]`
//! konvertieren. Kein Fehler dieses Subsystems eskaliert zu einem
//! Prozess-Fehler; Raeume bleiben fuer andere Teilnehmer nutzbar.

use thiserror::Error;

/// Globaler Result-Alias fuer Podium
pub type Result<T> = std::result::Result<T, PodiumError>;

/// Alle moeglichen Fehler im Podium-System
#[derive(Debug, Error)]
pub enum PodiumError {
    // --- Raeume & Teilnehmer ---
    #[error("Raum nicht gefunden: {0}")]
    RaumNichtGefunden(String),

    #[error("Raum ist voll")]
    RaumVoll,

    #[error("Teilnehmer nicht gefunden: {0}")]
    TeilnehmerNichtGefunden(String),

    // --- Verbindung ---
    #[error("Verbindungslimit erreicht: {0} gleichzeitige Verbindungen")]
    VerbindungsLimit(usize),

    #[error("Verbindung getrennt: {0}")]
    Getrennt(String),

    // --- Protokoll ---
    #[error("Ungueltige Nachricht: {0}")]
    UngueltigeNachricht(String),

    // --- Externe Mitspieler ---
    #[error("Feedback-Generator-Fehler: {0}")]
    FeedbackGenerator(String),

    #[error("Report-Store-Fehler: {0}")]
    ReportStore(String),

    #[error("Metrik-Dienst-Fehler: {0}")]
    MetrikDienst(String),

    // --- Konfiguration ---
    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),

    // --- Intern ---
    #[error("Interner Fehler: {0}")]
    Intern(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl PodiumError {
    /// Erstellt einen internen Fehler aus einer beliebigen Nachricht
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehler_anzeige() {
        let e = PodiumError::RaumNichtGefunden("ABC123".into());
        assert_eq!(e.to_string(), "Raum nicht gefunden: ABC123");
    }

    #[test]
    fn verbindungs_limit_nennt_anzahl() {
        let e = PodiumError::VerbindungsLimit(10);
        assert!(e.to_string().contains("10"));
    }
}
