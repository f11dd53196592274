//! podium-core – Gemeinsame Typen und Traits
//!
//! Dieser Crate definiert das Fundament fuer alle Podium-Crates:
//! - ID-Newtypes und Status-Enums (`types`)
//! - Domain-Modell Raum/Teilnehmer/Feedback (`model`)
//! - Zentrale Fehlertypen (`error`)
//! - Schnittstellen zu externen Mitspielern (`collab`)

pub mod collab;
pub mod error;
pub mod model;
pub mod types;

pub use error::{PodiumError, Result};
