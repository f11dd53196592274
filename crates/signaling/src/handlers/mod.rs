//! Handler fuer alle Client-Nachrichten
//!
//! Jeder Handler ist fuer eine Nachrichtenfamilie zustaendig und hat
//! Zugriff auf den gemeinsamen SignalingState.

pub mod feedback;
pub mod participant;
pub mod relay;
pub mod session;
