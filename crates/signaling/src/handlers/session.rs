//! Sprech-Sitzung – Zustandsmaschine fuer die Redner-Rotation
//!
//! waiting -> active -> speaking -> completed. Die Reihenfolge wird
//! beim Sitzungsstart als gleichverteilte Zufallspermutation der zu
//! diesem Zeitpunkt anwesenden Teilnehmer eingefroren; spaeter
//! Beitretende nehmen an der Rotation nicht teil. `completed` ist
//! terminal, weitere Rotations-Nachrichten sind No-ops.

use podium_core::types::{ParticipantId, RoomId, RoomStatus};
use podium_protocol::event::ServerEvent;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::server_state::SignalingState;

/// Berechnet die Sprech-Reihenfolge als Zufallspermutation.
///
/// Pur und deterministisch gegenueber dem uebergebenen Generator,
/// damit Tests mit einem geseedeten Rng arbeiten koennen.
pub fn sprech_reihenfolge_berechnen<R: Rng>(
    mut ids: Vec<ParticipantId>,
    rng: &mut R,
) -> Vec<ParticipantId> {
    ids.shuffle(rng);
    ids
}

/// Startet die Sitzung (waiting -> active).
///
/// Friert die Rotation ein, setzt den ersten Sprecher und die
/// Vorbereitungszeit und verkuendet `session_started` an alle Kanaele.
pub fn sitzung_starten(state: &Arc<SignalingState>, room_id: &RoomId) {
    let Some(raum_arc) = state.rooms.get(room_id) else {
        return;
    };

    let mut raum = raum_arc.lock();
    if raum.status != RoomStatus::Waiting {
        debug!(raum = %room_id, status = ?raum.status, "Sitzungsstart ausserhalb von waiting ignoriert");
        return;
    }

    let ids: Vec<ParticipantId> = raum.participants.iter().map(|p| p.id.clone()).collect();
    raum.speaking_order = sprech_reihenfolge_berechnen(ids, &mut rand::rng());
    raum.current_speaker = raum.speaking_order.first().cloned();
    raum.preparation_time = state.config.vorbereitungszeit_sek;
    raum.status = RoomStatus::Active;

    let raum_snapshot = raum.clone();
    state.registry.an_raum_senden(
        room_id,
        ServerEvent::SessionStarted { room: raum_snapshot }.into(),
        None,
    );
    drop(raum);

    info!(raum = %room_id, "Sitzung gestartet");
}

/// Schliesst die Vorbereitungsphase ab (active -> speaking)
pub fn vorbereitung_abgeschlossen(state: &Arc<SignalingState>, room_id: &RoomId) {
    let Some(raum_arc) = state.rooms.get(room_id) else {
        return;
    };

    let mut raum = raum_arc.lock();
    if raum.status == RoomStatus::Completed {
        return;
    }
    raum.status = RoomStatus::Speaking;

    let raum_snapshot = raum.clone();
    let sprecher = raum.current_speaker.clone();
    state.registry.an_raum_senden(
        room_id,
        ServerEvent::SpeakingStarted {
            room: raum_snapshot,
            current_speaker: sprecher,
        }
        .into(),
        None,
    );
    drop(raum);

    info!(raum = %room_id, "Sprechphase begonnen");
}

/// Markiert einen Sprecher als fertig und rueckt die Rotation weiter.
///
/// Ohne explizite Angabe zaehlt der aktuelle Sprecher als fertig.
/// Letzter Eintrag der Reihenfolge schliesst die Sitzung ab; ein
/// Sprecher ausserhalb der Reihenfolge wird nur markiert und geloggt.
pub fn sprecher_fertig(
    state: &Arc<SignalingState>,
    room_id: &RoomId,
    sprecher: Option<ParticipantId>,
    absender: &ParticipantId,
) {
    let Some(raum_arc) = state.rooms.get(room_id) else {
        return;
    };

    let mut raum = raum_arc.lock();
    if raum.status == RoomStatus::Completed {
        debug!(raum = %room_id, "Rotationsnachricht in abgeschlossener Sitzung ignoriert");
        return;
    }

    // Ohne expliziten Sprecher zaehlt nur der aktuelle Sprecher; gibt
    // es keinen, hat die Rotation nie begonnen und nichts ist fertig.
    let Some(fertig) = sprecher.or_else(|| raum.current_speaker.clone()) else {
        debug!(
            raum = %room_id,
            absender = %absender,
            "Sprecher-fertig ohne aktiven Sprecher ignoriert"
        );
        return;
    };

    if let Some(p) = raum.teilnehmer_mut(&fertig) {
        p.has_spoken = true;
    }

    weiterruecken(state, room_id, &mut raum, &fertig);
}

/// Operatorgesteuertes Weiterruecken vom aktuellen Sprecher aus
pub fn naechster_sprecher(state: &Arc<SignalingState>, room_id: &RoomId) {
    let Some(raum_arc) = state.rooms.get(room_id) else {
        return;
    };

    let mut raum = raum_arc.lock();
    if raum.status == RoomStatus::Completed {
        return;
    }
    let Some(aktuell) = raum.current_speaker.clone() else {
        return;
    };
    if let Some(p) = raum.teilnehmer_mut(&aktuell) {
        p.has_spoken = true;
    }
    weiterruecken(state, room_id, &mut raum, &aktuell);
}

/// Rueckt von `fertig` aus zum naechsten Eintrag der Reihenfolge oder
/// schliesst die Sitzung ab, wenn `fertig` der letzte Eintrag war.
/// Laeuft unter der bereits gehaltenen Raum-Sperre.
fn weiterruecken(
    state: &Arc<SignalingState>,
    room_id: &RoomId,
    raum: &mut podium_core::model::Room,
    fertig: &ParticipantId,
) {
    let Some(index) = raum.speaking_order.iter().position(|id| id == fertig) else {
        warn!(
            raum = %room_id,
            sprecher = %fertig,
            "Fertiger Sprecher nicht in der Reihenfolge, Rotation unveraendert"
        );
        return;
    };

    if index + 1 < raum.speaking_order.len() {
        let naechster = raum.speaking_order[index + 1].clone();
        raum.current_speaker = Some(naechster.clone());
        raum.status = RoomStatus::Speaking;

        let raum_snapshot = raum.clone();
        state.registry.an_raum_senden(
            room_id,
            ServerEvent::SpeakerChanged {
                room: raum_snapshot,
                current_speaker: Some(naechster.clone()),
            }
            .into(),
            None,
        );
        info!(raum = %room_id, sprecher = %naechster, "Sprecherwechsel");
    } else {
        raum.current_speaker = None;
        raum.status = RoomStatus::Completed;

        let raum_snapshot = raum.clone();
        state.registry.an_raum_senden(
            room_id,
            ServerEvent::SessionCompleted { room: raum_snapshot }.into(),
            None,
        );
        info!(raum = %room_id, "Sitzung abgeschlossen");
    }
}
