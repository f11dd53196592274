//! podium-protocol – Wire-Protokoll des Raum-Kanals
//!
//! Definiert die JSON-Nachrichten die ueber die persistente
//! WebSocket-Verbindung zwischen Client und Server fliessen:
//!
//! - `client`: eingehende Nachrichten (tagged Enum + Fallback fuer
//!   unbekannte Typen, die der Relay wortgleich weiterleitet)
//! - `event`: ausgehende Broadcast-Events mit Raum-Snapshot

pub mod client;
pub mod event;

// Bequeme Re-Exporte
pub use client::{ClientMessage, FeedbackPayload, Incoming, SignalPayload};
pub use event::{Outbound, ServerEvent};
