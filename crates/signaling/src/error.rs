//! Fehlertypen fuer den Signaling-Kern

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use podium_core::PodiumError;
use serde_json::json;
use thiserror::Error;

/// Fehlertyp fuer den Signaling-Kern
#[derive(Debug, Error)]
pub enum SignalingError {
    /// Raum-Code existiert nicht
    #[error("Raum nicht gefunden: {0}")]
    RaumNichtGefunden(String),

    /// Anti-Missbrauch-Limit gleichzeitiger Verbindungen pro Raum
    #[error("Verbindungslimit des Raums erreicht: {0}")]
    VerbindungsLimit(String),

    /// Konfigurierte Raum-Kapazitaet erreicht
    #[error("Raum ist voll: {0}")]
    RaumVoll(String),

    /// Ungueltige Anfrage (fehlende oder widerspruechliche Felder)
    #[error("Ungueltige Eingabe: {0}")]
    UngueltigeEingabe(String),

    /// Fehler eines externen Mitspielers (LLM, Report-Store, Metrik)
    #[error("Mitspieler-Fehler: {0}")]
    Mitspieler(#[from] PodiumError),

    /// Interner Fehler
    #[error("Interner Fehler: {0}")]
    Intern(#[from] anyhow::Error),
}

/// Result-Typ fuer den Signaling-Kern
pub type SignalingResult<T> = Result<T, SignalingError>;

impl SignalingError {
    /// HTTP-Statuscode fuer REST-Fehlerantworten
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::RaumNichtGefunden(_) => StatusCode::NOT_FOUND,
            Self::RaumVoll(_) | Self::VerbindungsLimit(_) => StatusCode::CONFLICT,
            Self::UngueltigeEingabe(_) => StatusCode::BAD_REQUEST,
            Self::Mitspieler(_) | Self::Intern(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SignalingError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        (
            status,
            Json(json!({
                "error": { "code": status.as_u16(), "message": self.to_string() }
            })),
        )
            .into_response()
    }
}
