//! podium-signaling – Raum-Koordination und WebRTC-Signaling
//!
//! Dieser Crate implementiert den Echtzeit-Kern von Podium. Er
//! verwaltet WebSocket-Verbindungen, Raum-Mitgliedschaft, die
//! Redner-Rotation und das Weiterleiten von WebRTC-Verhandlungsdaten
//! zwischen den Teilnehmern eines Raums.
//!
//! ## Architektur
//!
//! ```text
//! Axum Router (web::router)
//!     |
//!     v
//! websocket_verarbeiten (pro Verbindung ein Task)
//!     |  Raum pruefen -> Limit pruefen -> Zulassung -> Schleife
//!     |
//!     v
//! MessageDispatcher
//!     |
//!     +-- participant (Zulassung, Name, Kamera/Mikrofon, Entfernung)
//!     +-- relay       (webrtc_offer / answer / ice_candidate, Unbekanntes)
//!     +-- session     (start_session, speaker_finished, next_speaker)
//!     +-- feedback    (send_feedback an alle inkl. Absender)
//!
//! ConnectionRegistry – lebende Kanaele je Raum, Broadcast-Fan-out
//! RoomStore          – autoritativer Raum-Zustand hinter je einer Sperre
//! ```
//!
//! Alle Mutation-plus-Broadcast-Sequenzen eines Raums laufen unter der
//! Raum-Sperre; Sendungen sind nicht-blockierende try_send-Aufrufe,
//! damit haelt kein langsamer Empfaenger die Sperre fest.

pub mod broadcast;
pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod rooms;
pub mod server_state;
pub mod web;

// Bequeme Re-Exporte
pub use broadcast::ConnectionRegistry;
pub use error::SignalingError;
pub use rooms::RoomStore;
pub use server_state::{SignalingConfig, SignalingState};
