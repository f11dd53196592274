//! Room-Store – Autoritativer In-Memory-Zustand aller Raeume
//!
//! Jeder Raum liegt hinter einer eigenen Mutex: alle
//! Lese-Modifikations-Broadcast-Sequenzen halten die Sperre des Raums
//! bis einschliesslich der Broadcasts (die via try_send synchron sind,
//! also ohne Suspension-Punkt). Damit ist die Reihenfolge der
//! Broadcasts pro Raum konsistent mit der Reihenfolge der akzeptierten
//! Mutationen – auch auf einem multi-threaded Executor. Raeume sind
//! unabhaengige Sperr-Domaenen; es gibt kein raumuebergreifendes Locking.

use dashmap::DashMap;
use parking_lot::Mutex;
use podium_core::model::{Room, RoomConfig};
use podium_core::types::{RoomId, RoomStatus};
use std::sync::Arc;

/// Haelt alle Raeume des Prozesses
///
/// Wird beim Start erstellt und explizit injiziert; Tests bauen sich
/// eine frische Instanz. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct RoomStore {
    inner: Arc<RoomStoreInner>,
}

struct RoomStoreInner {
    raeume: DashMap<RoomId, Arc<Mutex<Room>>>,
}

impl RoomStore {
    /// Erstellt einen neuen, leeren Store
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(RoomStoreInner {
                raeume: DashMap::new(),
            }),
        }
    }

    /// Erstellt einen Raum mit frisch generiertem Code
    ///
    /// Gibt den Snapshot des neuen Raums zurueck.
    pub fn erstellen(&self, config: RoomConfig) -> Room {
        // Code-Kollisionen sind praktisch ausgeschlossen, werden aber
        // dennoch abgefangen
        let id = loop {
            let kandidat = RoomId::generieren();
            if !self.inner.raeume.contains_key(&kandidat) {
                break kandidat;
            }
        };

        let raum = Room::neu(id.clone(), config);
        self.inner
            .raeume
            .insert(id.clone(), Arc::new(Mutex::new(raum.clone())));

        tracing::info!(raum = %id, name = %raum.name, "Raum erstellt");
        raum
    }

    /// Fuegt einen fertigen Raum ein (fuer Tests und Wiederherstellung)
    pub fn einfuegen(&self, raum: Room) {
        self.inner
            .raeume
            .insert(raum.id.clone(), Arc::new(Mutex::new(raum)));
    }

    /// Gibt das Sperr-Handle eines Raums zurueck
    pub fn get(&self, room_id: &RoomId) -> Option<Arc<Mutex<Room>>> {
        self.inner.raeume.get(room_id).map(|e| Arc::clone(&e))
    }

    /// Prueft, ob ein Raum existiert
    pub fn enthaelt(&self, room_id: &RoomId) -> bool {
        self.inner.raeume.contains_key(room_id)
    }

    /// Gibt einen Snapshot des Raums zurueck
    pub fn snapshot(&self, room_id: &RoomId) -> Option<Room> {
        self.get(room_id).map(|raum| raum.lock().clone())
    }

    /// Gibt alle oeffentlichen Raeume im Zustand `waiting` zurueck
    pub fn oeffentliche_raeume(&self) -> Vec<Room> {
        self.inner
            .raeume
            .iter()
            .filter_map(|eintrag| {
                let raum = eintrag.value().lock();
                (raum.is_public && raum.status == RoomStatus::Waiting).then(|| raum.clone())
            })
            .collect()
    }

    /// Entfernt einen Raum wenn er keine Teilnehmer mehr hat
    ///
    /// Raum-leerender Cleanup nach dem letzten Disconnect; ein frisch
    /// erstellter Raum ohne jemals verbundene Teilnehmer bleibt stehen.
    pub fn entfernen_wenn_leer(&self, room_id: &RoomId) -> bool {
        let leer = match self.get(room_id) {
            Some(raum) => raum.lock().participants.is_empty(),
            None => return false,
        };
        if leer {
            self.inner.raeume.remove(room_id);
            tracing::info!(raum = %room_id, "Leerer Raum entfernt");
        }
        leer
    }

    /// Gibt die Anzahl der Raeume zurueck
    pub fn anzahl(&self) -> usize {
        self.inner.raeume.len()
    }
}

impl Default for RoomStore {
    fn default() -> Self {
        Self::neu()
    }
}
