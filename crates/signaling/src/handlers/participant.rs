//! Teilnehmer-Lebenszyklus – Zulassung, Entfernung, Identitaet, Geraete
//!
//! Haelt Registry und Room-Store konsistent: jede Zulassung und jede
//! Entfernung aktualisiert beide Seiten. Alle Mutation-plus-Broadcast-
//! Sequenzen laufen unter der Raum-Sperre, damit alle Kanaele dieselbe
//! Ereignis-Reihenfolge sehen.

use podium_core::model::Participant;
use podium_core::types::{ConnectionId, ParticipantId, RoomId};
use podium_protocol::event::ServerEvent;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::SignalingError;
use crate::server_state::SignalingState;

/// Ergebnis einer erfolgreichen Zulassung
#[derive(Debug, Clone)]
pub struct Zulassung {
    pub participant_id: ParticipantId,
    /// true, wenn die Identitaet bereits im Raum war (idempotenter
    /// Wiederbeitritt, kein neuer Teilnehmer-Datensatz)
    pub wiederbeitritt: bool,
    pub ist_host: bool,
}

/// Laesst eine Verbindung als Teilnehmer in den Raum zu.
///
/// Bei neuer Identitaet wird ein Teilnehmer angelegt (der erste im Raum
/// wird Host); bei bekannter Identitaet ist die Zulassung idempotent
/// und registriert nur den Kanal neu. Nach der Mutation geht
/// `participant_joined` an alle anderen Kanaele und erst danach
/// `room_state` gezielt an den neuen Kanal, damit dessen eigene Sicht
/// den gerade verkuendeten Stand widerspiegelt.
pub fn zulassen(
    state: &Arc<SignalingState>,
    room_id: &RoomId,
    connection_id: ConnectionId,
    user_id: Option<String>,
    user_name: Option<String>,
) -> Result<Zulassung, SignalingError> {
    let raum_arc = state
        .rooms
        .get(room_id)
        .ok_or_else(|| SignalingError::RaumNichtGefunden(room_id.to_string()))?;

    let participant_id = match user_id {
        Some(id) if !id.is_empty() => ParticipantId::from(id),
        _ => ParticipantId::neu(),
    };
    let display_name = user_name.unwrap_or_else(|| "Guest".to_string());

    let mut raum = raum_arc.lock();

    let wiederbeitritt = raum.participants.iter().any(|p| p.id == participant_id);
    let (teilnehmer, ist_host) = if wiederbeitritt {
        // Idempotenter Wiederbeitritt: kein Duplikat, Name ggf. aktualisieren
        let p = raum
            .teilnehmer_mut(&participant_id)
            .ok_or_else(|| SignalingError::Intern(anyhow::anyhow!("teilnehmer verschwunden")))?;
        if p.display_name == "Guest" && display_name != "Guest" {
            p.display_name = display_name;
        }
        (p.clone(), p.is_host)
    } else {
        if raum.ist_voll() {
            return Err(SignalingError::RaumVoll(room_id.to_string()));
        }
        let ist_host = raum.participants.is_empty();
        let p = Participant::neu(participant_id.clone(), display_name, ist_host);
        raum.participants.push(p.clone());
        (p, ist_host)
    };

    state.registry.identitaet_setzen(&connection_id, participant_id.clone());

    let raum_snapshot = raum.clone();

    // Reihenfolge: erst joined an die anderen, dann room_state an den Neuen
    state.registry.an_raum_senden(
        room_id,
        ServerEvent::ParticipantJoined {
            room: raum_snapshot.clone(),
            participant: teilnehmer,
        }
        .into(),
        Some(&connection_id),
    );
    state.registry.an_verbindung_senden(
        &connection_id,
        ServerEvent::RoomState {
            room: raum_snapshot,
            participant_id: participant_id.clone(),
        }
        .into(),
    );
    drop(raum);

    info!(
        raum = %room_id,
        teilnehmer = %participant_id,
        wiederbeitritt,
        ist_host,
        "Teilnehmer zugelassen"
    );

    Ok(Zulassung {
        participant_id,
        wiederbeitritt,
        ist_host,
    })
}

/// Entfernt einen Teilnehmer beim Verbindungsende.
///
/// Best-effort: jeder Aufraeum-Schritt laeuft unabhaengig, ein Fehler
/// in einem Schritt verhindert die uebrigen nicht. Geist-Eintraege in
/// `speaking_order` bleiben bestehen; die Rotation ueberspringt sie
/// beim naechsten Wechsel nicht, sie bleiben historisch sichtbar.
pub fn entfernen(state: &Arc<SignalingState>, room_id: &RoomId, participant_id: &ParticipantId) {
    let Some(raum_arc) = state.rooms.get(room_id) else {
        debug!(raum = %room_id, "Entfernung fuer unbekannten Raum ignoriert");
        return;
    };

    let mut raum = raum_arc.lock();
    let vorher = raum.participants.len();
    raum.participants.retain(|p| &p.id != participant_id);

    if raum.participants.len() == vorher {
        return;
    }

    if raum.current_speaker.as_ref() == Some(participant_id) {
        warn!(
            raum = %room_id,
            teilnehmer = %participant_id,
            "Aktueller Sprecher hat den Raum verlassen"
        );
    }

    let raum_snapshot = raum.clone();
    state.registry.an_raum_senden(
        room_id,
        ServerEvent::ParticipantDisconnected {
            room: raum_snapshot,
            participant_id: participant_id.clone(),
        }
        .into(),
        None,
    );
    drop(raum);

    info!(raum = %room_id, teilnehmer = %participant_id, "Teilnehmer entfernt");
}

/// Aktualisiert den Anzeigenamen und verkuendet `participant_updated`.
///
/// Unbekannter Raum oder Teilnehmer ist ein No-op; die
/// Verbindungsschleife verarbeitet weitere Nachrichten normal.
pub fn name_aktualisieren(
    state: &Arc<SignalingState>,
    room_id: &RoomId,
    participant_id: &ParticipantId,
    neuer_name: String,
) {
    let Some(raum_arc) = state.rooms.get(room_id) else {
        return;
    };

    let mut raum = raum_arc.lock();
    let Some(p) = raum.teilnehmer_mut(participant_id) else {
        debug!(raum = %room_id, teilnehmer = %participant_id, "Namensaenderung fuer unbekannten Teilnehmer");
        return;
    };
    p.display_name = neuer_name;
    let teilnehmer = p.clone();

    let raum_snapshot = raum.clone();
    state.registry.an_raum_senden(
        room_id,
        ServerEvent::ParticipantUpdated {
            room: raum_snapshot,
            participant: teilnehmer,
        }
        .into(),
        None,
    );
}

/// Welches Geraet umgeschaltet wird
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Geraet {
    Kamera,
    Mikrofon,
}

/// Schaltet Kamera oder Mikrofon um und verkuendet `participant_updated`
pub fn geraet_umschalten(
    state: &Arc<SignalingState>,
    room_id: &RoomId,
    participant_id: &ParticipantId,
    geraet: Geraet,
    enabled: bool,
) {
    let Some(raum_arc) = state.rooms.get(room_id) else {
        return;
    };

    let mut raum = raum_arc.lock();
    let Some(p) = raum.teilnehmer_mut(participant_id) else {
        return;
    };
    match geraet {
        Geraet::Kamera => p.camera_enabled = enabled,
        Geraet::Mikrofon => p.mic_enabled = enabled,
    }
    let teilnehmer = p.clone();

    let raum_snapshot = raum.clone();
    state.registry.an_raum_senden(
        room_id,
        ServerEvent::ParticipantUpdated {
            room: raum_snapshot,
            participant: teilnehmer,
        }
        .into(),
        None,
    );
}
