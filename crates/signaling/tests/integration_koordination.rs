//! Integration-Tests fuer Zulassung, Rotation, Relay und Feedback
//!
//! Die Tests arbeiten direkt auf SignalingState, Registry und den
//! Handlern; die Empfangs-Queues der registrierten Kanaele stehen fuer
//! die Broadcast-Sicht der Clients. WebSocket-Transport ist hier
//! bewusst aussen vor.

use async_trait::async_trait;
use podium_core::collab::{
    AggregateStats, FeedbackGenerator, MetricsControl, ReportStore, SessionSummary,
};
use podium_core::model::RoomConfig;
use podium_core::types::{ConnectionId, ParticipantId, RoomId, RoomStatus};
use podium_protocol::client::{FeedbackPayload, SignalPayload};
use podium_protocol::event::Outbound;
use podium_signaling::handlers::{feedback, participant, relay, session};
use podium_signaling::{SignalingConfig, SignalingState};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Stummgeschaltete Mitspieler
// ---------------------------------------------------------------------------

struct StummerCoach;

#[async_trait]
impl FeedbackGenerator for StummerCoach {
    async fn generate_feedback(&self, _input: &str) -> podium_core::Result<String> {
        Ok("ok".to_string())
    }
}

struct StummerStore;

#[async_trait]
impl ReportStore for StummerStore {
    async fn save_report(&self, _summary: SessionSummary) -> podium_core::Result<()> {
        Ok(())
    }

    async fn load_stats(&self) -> podium_core::Result<AggregateStats> {
        Ok(AggregateStats::default())
    }
}

struct StummeMetrik;

#[async_trait]
impl MetricsControl for StummeMetrik {
    async fn start(&self) -> podium_core::Result<()> {
        Ok(())
    }

    async fn stop(&self) -> podium_core::Result<()> {
        Ok(())
    }

    async fn is_alive(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Hilfsfunktionen
// ---------------------------------------------------------------------------

fn state() -> Arc<SignalingState> {
    SignalingState::neu(
        SignalingConfig::default(),
        Arc::new(StummerCoach),
        Arc::new(StummerStore),
        Arc::new(StummeMetrik),
    )
}

fn raum_anlegen(state: &Arc<SignalingState>, max_participants: usize) -> RoomId {
    let raum = state.rooms.erstellen(RoomConfig {
        name: "Testraum".into(),
        topic: "Rhetorik".into(),
        time_per_speaker: 3,
        max_participants,
        is_public: true,
        description: String::new(),
        host_name: "Alice".into(),
    });
    raum.id
}

/// Registriert einen Kanal und laesst ihn als Teilnehmer zu
fn beitreten(
    state: &Arc<SignalingState>,
    room_id: &RoomId,
    user_id: &str,
    name: &str,
) -> (ConnectionId, mpsc::Receiver<Outbound>, ParticipantId) {
    let connection_id = ConnectionId::neu();
    let rx = state.registry.registrieren(room_id, connection_id, usize::MAX).expect("unter dem Limit");
    let zulassung = participant::zulassen(
        state,
        room_id,
        connection_id,
        Some(user_id.to_string()),
        Some(name.to_string()),
    )
    .expect("Zulassung fehlgeschlagen");
    (connection_id, rx, zulassung.participant_id)
}

/// Liest das naechste Ereignis aus einer Queue als JSON
fn naechstes(rx: &mut mpsc::Receiver<Outbound>) -> Value {
    let ausgehend = rx.try_recv().expect("Kein Ereignis in der Queue");
    serde_json::from_str(&ausgehend.als_text()).unwrap()
}

/// Leert die Queue und gibt alle Ereignis-Typen zurueck
fn alle_typen(rx: &mut mpsc::Receiver<Outbound>) -> Vec<String> {
    let mut typen = Vec::new();
    while let Ok(ausgehend) = rx.try_recv() {
        let wert: Value = serde_json::from_str(&ausgehend.als_text()).unwrap();
        typen.push(wert["type"].as_str().unwrap_or("?").to_string());
    }
    typen
}

// ---------------------------------------------------------------------------
// Zulassung
// ---------------------------------------------------------------------------

#[tokio::test]
async fn zulassung_sendet_joined_an_andere_und_room_state_an_neuen() {
    let state = state();
    let raum = raum_anlegen(&state, 6);

    let (_, mut rx_a, id_a) = beitreten(&state, &raum, "alice", "Alice");
    let eigener_state = naechstes(&mut rx_a);
    assert_eq!(eigener_state["type"], "room_state");
    assert_eq!(eigener_state["participant_id"], id_a.as_str());

    let (_, mut rx_b, id_b) = beitreten(&state, &raum, "bob", "Bob");

    // A sieht den Beitritt von B
    let joined = naechstes(&mut rx_a);
    assert_eq!(joined["type"], "participant_joined");
    assert_eq!(joined["participant"]["id"], id_b.as_str());
    assert_eq!(joined["room"]["participants"].as_array().unwrap().len(), 2);

    // B sieht nur den eigenen room_state, nicht das eigene joined
    let state_b = naechstes(&mut rx_b);
    assert_eq!(state_b["type"], "room_state");
    assert_eq!(state_b["participant_id"], id_b.as_str());
    assert!(rx_b.try_recv().is_err());
}

#[tokio::test]
async fn erster_teilnehmer_wird_host() {
    let state = state();
    let raum = raum_anlegen(&state, 6);

    let (_, mut rx_a, _) = beitreten(&state, &raum, "alice", "Alice");
    let (_, _rx_b, _) = beitreten(&state, &raum, "bob", "Bob");

    let eigener_state = naechstes(&mut rx_a);
    assert_eq!(eigener_state["room"]["participants"][0]["is_host"], true);

    let joined = naechstes(&mut rx_a);
    assert_eq!(joined["participant"]["is_host"], false);
}

#[tokio::test]
async fn voller_raum_lehnt_ab_ohne_mitgliedschaft_zu_aendern() {
    let state = state();
    let raum = raum_anlegen(&state, 2);

    beitreten(&state, &raum, "alice", "Alice");
    beitreten(&state, &raum, "bob", "Bob");

    let connection_id = ConnectionId::neu();
    let _rx = state.registry.registrieren(&raum, connection_id, usize::MAX).expect("unter dem Limit");
    let ergebnis = participant::zulassen(
        &state,
        &raum,
        connection_id,
        Some("carol".to_string()),
        Some("Carol".to_string()),
    );

    assert!(ergebnis.is_err());
    let snapshot = state.rooms.snapshot(&raum).unwrap();
    assert_eq!(snapshot.participants.len(), 2);
}

#[tokio::test]
async fn wiederbeitritt_ist_idempotent() {
    let state = state();
    let raum = raum_anlegen(&state, 2);

    let (_, _rx1, id1) = beitreten(&state, &raum, "alice", "Alice");
    let (_, _rx2, id2) = beitreten(&state, &raum, "alice", "Alice");

    assert_eq!(id1, id2);
    let snapshot = state.rooms.snapshot(&raum).unwrap();
    assert_eq!(snapshot.participants.len(), 1);
}

#[tokio::test]
async fn unbekannter_raum_lehnt_zulassung_ab() {
    let state = state();
    let connection_id = ConnectionId::neu();
    let raum = RoomId::from("FEHLT0");
    let _rx = state.registry.registrieren(&raum, connection_id, usize::MAX).expect("unter dem Limit");

    let ergebnis = participant::zulassen(&state, &raum, connection_id, None, None);
    assert!(ergebnis.is_err());
}

#[tokio::test]
async fn verbindungslimit_weist_elften_kanal_ab() {
    let state = state();
    let raum = raum_anlegen(&state, 6);
    let limit = state.config.verbindungs_limit_pro_raum;

    beitreten(&state, &raum, "alice", "Alice");
    beitreten(&state, &raum, "bob", "Bob");

    // Restliche Plaetze bis zum Limit mit rohen Kanaelen auffuellen
    let mut queues = Vec::new();
    while state.registry.verbindungs_anzahl(&raum) < limit {
        let rx = state
            .registry
            .registrieren(&raum, ConnectionId::neu(), limit)
            .expect("unter dem Limit");
        queues.push(rx);
    }
    assert_eq!(state.registry.verbindungs_anzahl(&raum), limit);

    let abgewiesen = state.registry.registrieren(&raum, ConnectionId::neu(), limit);
    assert!(abgewiesen.is_none());
    assert_eq!(state.registry.verbindungs_anzahl(&raum), limit);

    // Mitgliedschaft bleibt unberuehrt
    let snapshot = state.rooms.snapshot(&raum).unwrap();
    assert_eq!(snapshot.participants.len(), 2);
}

// ---------------------------------------------------------------------------
// Lebenszyklus
// ---------------------------------------------------------------------------

#[tokio::test]
async fn entfernung_verkuendet_disconnect_und_leerer_raum_verschwindet() {
    let state = state();
    let raum = raum_anlegen(&state, 6);

    let (conn_a, mut rx_a, id_a) = beitreten(&state, &raum, "alice", "Alice");
    let (conn_b, _rx_b, id_b) = beitreten(&state, &raum, "bob", "Bob");

    participant::entfernen(&state, &raum, &id_b);
    state.registry.entfernen(&raum, &conn_b);

    let typen = alle_typen(&mut rx_a);
    assert!(typen.contains(&"participant_disconnected".to_string()));
    assert!(!state.rooms.entfernen_wenn_leer(&raum));

    participant::entfernen(&state, &raum, &id_a);
    state.registry.entfernen(&raum, &conn_a);
    assert!(state.rooms.entfernen_wenn_leer(&raum));
    assert!(state.rooms.snapshot(&raum).is_none());
}

#[tokio::test]
async fn namensaenderung_verkuendet_update() {
    let state = state();
    let raum = raum_anlegen(&state, 6);

    let (_, _rx_a, id_a) = beitreten(&state, &raum, "alice", "Alice");
    let (_, mut rx_b, _) = beitreten(&state, &raum, "bob", "Bob");
    let _ = alle_typen(&mut rx_b);

    participant::name_aktualisieren(&state, &raum, &id_a, "Alicia".to_string());

    let update = naechstes(&mut rx_b);
    assert_eq!(update["type"], "participant_updated");
    assert_eq!(update["participant"]["display_name"], "Alicia");
}

#[tokio::test]
async fn geraete_umschalten_aendert_zustand() {
    let state = state();
    let raum = raum_anlegen(&state, 6);

    let (_, _rx_a, id_a) = beitreten(&state, &raum, "alice", "Alice");
    participant::geraet_umschalten(
        &state,
        &raum,
        &id_a,
        participant::Geraet::Kamera,
        false,
    );

    let snapshot = state.rooms.snapshot(&raum).unwrap();
    assert!(!snapshot.participants[0].camera_enabled);
    assert!(snapshot.participants[0].mic_enabled);
}

// ---------------------------------------------------------------------------
// Rotation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sitzungsstart_friert_permutation_ein() {
    let state = state();
    let raum = raum_anlegen(&state, 6);

    let (_, mut rx_a, id_a) = beitreten(&state, &raum, "alice", "Alice");
    let (_, _rx_b, id_b) = beitreten(&state, &raum, "bob", "Bob");
    let (_, _rx_c, id_c) = beitreten(&state, &raum, "carol", "Carol");
    let _ = alle_typen(&mut rx_a);

    session::sitzung_starten(&state, &raum);

    let gestartet = naechstes(&mut rx_a);
    assert_eq!(gestartet["type"], "session_started");
    assert_eq!(gestartet["room"]["status"], "active");

    let snapshot = state.rooms.snapshot(&raum).unwrap();
    assert_eq!(snapshot.speaking_order.len(), 3);
    for id in [&id_a, &id_b, &id_c] {
        assert!(snapshot.speaking_order.contains(id));
    }
    assert_eq!(
        snapshot.current_speaker.as_ref(),
        snapshot.speaking_order.first()
    );
    assert_eq!(snapshot.preparation_time, 60);

    // Spaeter Beitretende kommen nicht mehr in die Rotation
    beitreten(&state, &raum, "dave", "Dave");
    let snapshot = state.rooms.snapshot(&raum).unwrap();
    assert_eq!(snapshot.speaking_order.len(), 3);
}

#[tokio::test]
async fn rotation_laeuft_bis_zum_abschluss() {
    let state = state();
    let raum = raum_anlegen(&state, 6);

    let (_, mut rx_a, _) = beitreten(&state, &raum, "alice", "Alice");
    beitreten(&state, &raum, "bob", "Bob");
    let _ = alle_typen(&mut rx_a);

    session::sitzung_starten(&state, &raum);
    session::vorbereitung_abgeschlossen(&state, &raum);

    let reihenfolge = state.rooms.snapshot(&raum).unwrap().speaking_order;

    // Erster Sprecher fertig: Wechsel zum zweiten
    session::sprecher_fertig(&state, &raum, Some(reihenfolge[0].clone()), &reihenfolge[0]);
    let snapshot = state.rooms.snapshot(&raum).unwrap();
    assert_eq!(snapshot.status, RoomStatus::Speaking);
    assert_eq!(snapshot.current_speaker.as_ref(), Some(&reihenfolge[1]));

    // Letzter Sprecher fertig: Sitzung abgeschlossen
    session::sprecher_fertig(&state, &raum, Some(reihenfolge[1].clone()), &reihenfolge[1]);
    let snapshot = state.rooms.snapshot(&raum).unwrap();
    assert_eq!(snapshot.status, RoomStatus::Completed);
    assert!(snapshot.current_speaker.is_none());
    assert!(snapshot.participants.iter().all(|p| p.has_spoken));

    let typen = alle_typen(&mut rx_a);
    assert_eq!(
        typen,
        vec![
            "session_started",
            "speaking_started",
            "speaker_changed",
            "session_completed"
        ]
    );
}

#[tokio::test]
async fn abgeschlossene_sitzung_ignoriert_rotationsnachrichten() {
    let state = state();
    let raum = raum_anlegen(&state, 6);

    let (_, _rx_a, id_a) = beitreten(&state, &raum, "alice", "Alice");

    session::sitzung_starten(&state, &raum);
    session::sprecher_fertig(&state, &raum, Some(id_a.clone()), &id_a);
    assert_eq!(
        state.rooms.snapshot(&raum).unwrap().status,
        RoomStatus::Completed
    );

    session::naechster_sprecher(&state, &raum);
    session::sprecher_fertig(&state, &raum, Some(id_a.clone()), &id_a);
    let snapshot = state.rooms.snapshot(&raum).unwrap();
    assert_eq!(snapshot.status, RoomStatus::Completed);
    assert!(snapshot.current_speaker.is_none());
}

#[tokio::test]
async fn unbekannter_sprecher_wird_nur_markiert() {
    let state = state();
    let raum = raum_anlegen(&state, 6);

    let (_, _rx_a, id_a) = beitreten(&state, &raum, "alice", "Alice");
    let (_, _rx_b, id_b) = beitreten(&state, &raum, "bob", "Bob");

    session::sitzung_starten(&state, &raum);
    // Geist-Eintrag: Teilnehmer verlaesst den Raum nach Sitzungsstart
    participant::entfernen(&state, &raum, &id_b);

    // B bleibt in der Reihenfolge, die Rotation aendert sich durch den
    // Weggang nicht
    let snapshot = state.rooms.snapshot(&raum).unwrap();
    assert!(snapshot.speaking_order.contains(&id_b));

    // Ein nie zugelassener Sprecher laesst die Rotation unveraendert
    let vorher = state.rooms.snapshot(&raum).unwrap().current_speaker;
    session::sprecher_fertig(&state, &raum, Some(ParticipantId::from("fremd")), &id_a);
    let nachher = state.rooms.snapshot(&raum).unwrap().current_speaker;
    assert_eq!(vorher, nachher);
}

#[tokio::test]
async fn sprecher_fertig_vor_sitzungsstart_ist_noop() {
    let state = state();
    let raum = raum_anlegen(&state, 6);

    let (_, _rx_a, id_a) = beitreten(&state, &raum, "alice", "Alice");

    // Kein Sprecher angegeben, kein aktueller Sprecher: der Absender
    // darf nicht stillschweigend als fertig gelten
    session::sprecher_fertig(&state, &raum, None, &id_a);

    let snapshot = state.rooms.snapshot(&raum).unwrap();
    assert_eq!(snapshot.status, RoomStatus::Waiting);
    assert!(!snapshot.participants[0].has_spoken);
    assert!(snapshot.current_speaker.is_none());
}

// ---------------------------------------------------------------------------
// Relay
// ---------------------------------------------------------------------------

#[tokio::test]
async fn relay_erzwingt_absender_und_schliesst_ihn_aus() {
    let state = state();
    let raum = raum_anlegen(&state, 6);

    let (conn_a, mut rx_a, id_a) = beitreten(&state, &raum, "alice", "Alice");
    let (_, mut rx_b, _) = beitreten(&state, &raum, "bob", "Bob");
    let _ = alle_typen(&mut rx_a);
    let _ = alle_typen(&mut rx_b);

    let mut rest = Map::new();
    rest.insert("from".to_string(), Value::String("gefaelscht".into()));
    rest.insert("sdp".to_string(), Value::String("v=0...".into()));
    relay::signal_weiterleiten(
        &state,
        &raum,
        conn_a,
        &id_a,
        "webrtc_offer",
        SignalPayload { to: None, rest },
    );

    let offer = naechstes(&mut rx_b);
    assert_eq!(offer["type"], "webrtc_offer");
    assert_eq!(offer["from"], id_a.as_str());
    assert_eq!(offer["sdp"], "v=0...");
    assert!(rx_a.try_recv().is_err());
}

#[tokio::test]
async fn unbekannter_typ_wird_wortgleich_durchgereicht() {
    let state = state();
    let raum = raum_anlegen(&state, 6);

    let (conn_a, mut rx_a, _) = beitreten(&state, &raum, "alice", "Alice");
    let (_, mut rx_b, _) = beitreten(&state, &raum, "bob", "Bob");
    let _ = alle_typen(&mut rx_a);
    let _ = alle_typen(&mut rx_b);

    let roh: Value =
        serde_json::from_str(r#"{"type":"emoji_reaction","emoji":"clap"}"#).unwrap();
    relay::unbekannt_weiterleiten(&state, &raum, conn_a, roh.clone());

    let empfangen = naechstes(&mut rx_b);
    assert_eq!(empfangen, roh);
    assert!(rx_a.try_recv().is_err());
}

// ---------------------------------------------------------------------------
// Feedback
// ---------------------------------------------------------------------------

#[tokio::test]
async fn feedback_geht_an_alle_inklusive_absender() {
    let state = state();
    let raum = raum_anlegen(&state, 6);

    let (_, mut rx_a, id_a) = beitreten(&state, &raum, "alice", "Alice");
    let (_, mut rx_b, id_b) = beitreten(&state, &raum, "bob", "Bob");
    let _ = alle_typen(&mut rx_a);
    let _ = alle_typen(&mut rx_b);

    feedback::feedback_senden(
        &state,
        &raum,
        &id_a,
        FeedbackPayload {
            to_participant: id_b.clone(),
            message: "Tolles Beispiel am Anfang!".to_string(),
            feedback_type: podium_core::model::FeedbackType::Positive,
        },
    );

    let bei_b = naechstes(&mut rx_b);
    assert_eq!(bei_b["type"], "send_feedback");
    assert_eq!(bei_b["feedback"]["from_name"], "Alice");

    // Echo beim Absender
    let bei_a = naechstes(&mut rx_a);
    assert_eq!(bei_a["type"], "send_feedback");

    let snapshot = state.rooms.snapshot(&raum).unwrap();
    assert_eq!(snapshot.feedback_log.len(), 1);
    assert_eq!(snapshot.feedback_log[0].to_participant, id_b);
}
