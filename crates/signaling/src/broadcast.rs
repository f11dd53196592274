//! Connection-Registry – Verwaltet die lebenden Kanaele pro Raum
//!
//! Die Registry haelt die Send-Queues aller verbundenen Clients und
//! stellt Broadcast- und gezielte Sende-Primitive bereit.
//!
//! ## Zustellung
//! - Best-effort und pro Kanal unabhaengig: ein toter oder langsamer
//!   Empfaenger darf die Zustellung an andere niemals aufhalten
//! - Geschlossene Kanaele werden beim Senden lazy aus der Registry
//!   entfernt statt einen Fehler zu propagieren
//! - Leere Broadcast-Mengen werden als Eintrag geloescht, nicht nur
//!   geleert, damit verlassene Raeume nicht unbegrenzt wachsen

use dashmap::DashMap;
use podium_core::types::{ConnectionId, ParticipantId, RoomId};
use podium_protocol::event::Outbound;
use std::sync::Arc;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Konfiguration
// ---------------------------------------------------------------------------

/// Groesse der Send-Queue pro Kanal
const SEND_QUEUE_GROESSE: usize = 64;

// ---------------------------------------------------------------------------
// ClientSender
// ---------------------------------------------------------------------------

/// Ergebnis eines einzelnen Sendeversuchs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendErgebnis {
    /// Nachricht eingereiht
    Gesendet,
    /// Queue voll – Nachricht verworfen, Kanal lebt weiter
    Verworfen,
    /// Queue geschlossen – Kanal ist tot und muss entfernt werden
    Geschlossen,
}

/// Handle auf die Send-Queue eines verbundenen Kanals
#[derive(Clone, Debug)]
pub struct ClientSender {
    pub connection_id: ConnectionId,
    /// Teilnehmer-Identitaet, sobald die Zulassung abgeschlossen ist
    pub participant_id: Option<ParticipantId>,
    tx: mpsc::Sender<Outbound>,
}

impl ClientSender {
    /// Sendet eine Nachricht nicht-blockierend an den Kanal
    pub fn senden(&self, nachricht: Outbound) -> SendErgebnis {
        match self.tx.try_send(nachricht) {
            Ok(()) => SendErgebnis::Gesendet,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(
                    verbindung = %self.connection_id,
                    "Send-Queue voll – Nachricht verworfen"
                );
                SendErgebnis::Verworfen
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(
                    verbindung = %self.connection_id,
                    "Send-Queue geschlossen (Client getrennt)"
                );
                SendErgebnis::Geschlossen
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ConnectionRegistry
// ---------------------------------------------------------------------------

/// Registry aller lebenden Kanaele, gruppiert nach Raum
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
/// Wird beim Start erstellt und explizit in alle Komponenten gereicht
/// (Tests injizieren eine frische Instanz).
#[derive(Clone)]
pub struct ConnectionRegistry {
    inner: Arc<ConnectionRegistryInner>,
}

struct ConnectionRegistryInner {
    /// Broadcast-Menge pro Raum
    raum_kanaele: DashMap<RoomId, Vec<ConnectionId>>,
    /// Send-Queues, indiziert nach ConnectionId
    sender: DashMap<ConnectionId, ClientSender>,
    /// Zulassungs-Buchhaltung: (Raum, Origin+Identitaets-Prefix) -> Kanal
    ///
    /// Pro Key lebt genau ein Kanal; ein Duplikat verdraengt seinen
    /// Vorgaenger. Kein Sicherheitsmechanismus.
    zulassungs_keys: DashMap<(RoomId, String), ConnectionId>,
}

impl ConnectionRegistry {
    /// Erstellt eine neue, leere Registry
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(ConnectionRegistryInner {
                raum_kanaele: DashMap::new(),
                sender: DashMap::new(),
                zulassungs_keys: DashMap::new(),
            }),
        }
    }

    /// Registriert einen Kanal fuer einen Raum und gibt seine
    /// Empfangs-Queue zurueck, sofern der Raum unter `limit` Kanaelen
    /// liegt; am Limit wird nichts eingetragen und `None` geliefert.
    ///
    /// Pruefung und Eintrag laufen unter derselben Entry-Sperre der
    /// Broadcast-Menge, zwei gleichzeitige Registrierungen koennen das
    /// Limit daher nicht gemeinsam ueberschreiten. No-op fuer die
    /// Broadcast-Menge wenn der Kanal bereits enthalten ist. Die
    /// Verbindungs-Schleife liest aus der Queue und schreibt auf den
    /// WebSocket.
    pub fn registrieren(
        &self,
        room_id: &RoomId,
        connection_id: ConnectionId,
        limit: usize,
    ) -> Option<mpsc::Receiver<Outbound>> {
        let (tx, rx) = mpsc::channel(SEND_QUEUE_GROESSE);
        self.inner.sender.insert(
            connection_id,
            ClientSender {
                connection_id,
                participant_id: None,
                tx,
            },
        );

        let mut kanaele = self
            .inner
            .raum_kanaele
            .entry(room_id.clone())
            .or_default();
        if !kanaele.contains(&connection_id) {
            if kanaele.len() >= limit {
                let ist_leer = kanaele.is_empty();
                drop(kanaele);
                if ist_leer {
                    self.inner.raum_kanaele.remove(room_id);
                }
                self.inner.sender.remove(&connection_id);
                tracing::debug!(
                    raum = %room_id,
                    verbindung = %connection_id,
                    limit,
                    "Registrierung am Verbindungslimit abgewiesen"
                );
                return None;
            }
            kanaele.push(connection_id);
        }
        drop(kanaele);

        tracing::debug!(raum = %room_id, verbindung = %connection_id, "Kanal registriert");
        Some(rx)
    }

    /// Bindet die Teilnehmer-Identitaet an einen registrierten Kanal
    pub fn identitaet_setzen(&self, connection_id: &ConnectionId, participant_id: ParticipantId) {
        if let Some(mut sender) = self.inner.sender.get_mut(connection_id) {
            sender.participant_id = Some(participant_id);
        }
    }

    /// Hinterlegt den Zulassungs-Key eines Kanals
    ///
    /// Ein bereits vorhandener Key desselben Ursprungs wird ersetzt
    /// (idempotenter Re-Join). Traegt der ersetzte Eintrag noch einen
    /// lebenden Kanal, wird dieser zurueckgegeben, damit der Aufrufer
    /// ihn verdraengen kann; pro (Raum, Key) lebt genau ein Kanal.
    pub fn zulassungs_key_setzen(
        &self,
        room_id: &RoomId,
        key: String,
        connection_id: ConnectionId,
    ) -> Option<ConnectionId> {
        let vorgaenger = self
            .inner
            .zulassungs_keys
            .insert((room_id.clone(), key), connection_id);
        match vorgaenger {
            Some(alt) if alt != connection_id && self.ist_registriert(&alt) => Some(alt),
            _ => None,
        }
    }

    /// Prueft ob ein anderer lebender Kanal dieselbe Identitaet traegt
    ///
    /// Nach einer Verdraengung darf der alte Kanal den Teilnehmer beim
    /// Aufraeumen nicht mitnehmen, solange die Identitaet anderswo
    /// verbunden ist.
    pub fn identitaet_anderweitig_verbunden(
        &self,
        connection_id: &ConnectionId,
        participant_id: &ParticipantId,
    ) -> bool {
        self.inner.sender.iter().any(|eintrag| {
            eintrag.key() != connection_id
                && eintrag.value().participant_id.as_ref() == Some(participant_id)
        })
    }

    /// Entfernt einen Kanal aus Raum-Menge, Sender-Tabelle und
    /// Zulassungs-Buchhaltung
    ///
    /// Wird die Broadcast-Menge des Raums dadurch leer, wird der
    /// Eintrag selbst geloescht.
    pub fn entfernen(&self, room_id: &RoomId, connection_id: &ConnectionId) {
        self.inner.sender.remove(connection_id);

        if let Some(mut kanaele) = self.inner.raum_kanaele.get_mut(room_id) {
            kanaele.retain(|cid| cid != connection_id);
            let ist_leer = kanaele.is_empty();
            drop(kanaele);
            if ist_leer {
                self.inner.raum_kanaele.remove(room_id);
            }
        }

        self.inner
            .zulassungs_keys
            .retain(|_, cid| cid != connection_id);

        tracing::debug!(raum = %room_id, verbindung = %connection_id, "Kanal entfernt");
    }

    /// Sendet eine Nachricht an alle Kanaele eines Raums
    ///
    /// `ausser` schliesst einen Kanal aus (typisch: den Ausloeser).
    /// Tote Kanaele werden lazy entfernt; Fehler einzelner Empfaenger
    /// beruehren die uebrigen nicht. Gibt die Anzahl der erfolgreichen
    /// Sendungen zurueck.
    pub fn an_raum_senden(
        &self,
        room_id: &RoomId,
        nachricht: Outbound,
        ausser: Option<&ConnectionId>,
    ) -> usize {
        let kanaele = match self.inner.raum_kanaele.get(room_id) {
            Some(ids) => ids.clone(),
            None => return 0,
        };

        let mut gesendet = 0;
        let mut tote: Vec<ConnectionId> = Vec::new();

        for cid in &kanaele {
            if Some(cid) == ausser {
                continue;
            }
            match self.inner.sender.get(cid) {
                Some(sender) => match sender.senden(nachricht.clone()) {
                    SendErgebnis::Gesendet => gesendet += 1,
                    SendErgebnis::Verworfen => {}
                    SendErgebnis::Geschlossen => tote.push(*cid),
                },
                None => tote.push(*cid),
            }
        }

        for cid in &tote {
            self.entfernen(room_id, cid);
        }

        gesendet
    }

    /// Sendet eine Nachricht gezielt an einen Kanal
    ///
    /// Gibt `false` zurueck wenn der Kanal fehlt oder die Queue
    /// geschlossen/voll ist. Fuer den Raum ist das nicht fatal.
    pub fn an_verbindung_senden(&self, connection_id: &ConnectionId, nachricht: Outbound) -> bool {
        match self.inner.sender.get(connection_id) {
            Some(sender) => sender.senden(nachricht) == SendErgebnis::Gesendet,
            None => {
                tracing::debug!(verbindung = %connection_id, "Senden an unbekannten Kanal");
                false
            }
        }
    }

    /// Gibt die Anzahl der aktuell registrierten Kanaele eines Raums zurueck
    pub fn verbindungs_anzahl(&self, room_id: &RoomId) -> usize {
        self.inner
            .raum_kanaele
            .get(room_id)
            .map(|ids| ids.len())
            .unwrap_or(0)
    }

    /// Prueft ob ein Kanal registriert ist
    pub fn ist_registriert(&self, connection_id: &ConnectionId) -> bool {
        self.inner.sender.contains_key(connection_id)
    }

    /// Prueft ob fuer einen Raum ueberhaupt noch ein Eintrag existiert
    pub fn raum_hat_kanaele(&self, room_id: &RoomId) -> bool {
        self.inner.raum_kanaele.contains_key(room_id)
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_nachricht(text: &str) -> Outbound {
        Outbound::Raw(serde_json::json!({ "type": "test", "text": text }))
    }

    #[tokio::test]
    async fn registrieren_und_gezielt_senden() {
        let registry = ConnectionRegistry::neu();
        let raum = RoomId::from("ABC123");
        let cid = ConnectionId::neu();

        let mut rx = registry.registrieren(&raum, cid, usize::MAX).expect("unter dem Limit");
        assert!(registry.ist_registriert(&cid));
        assert_eq!(registry.verbindungs_anzahl(&raum), 1);

        assert!(registry.an_verbindung_senden(&cid, test_nachricht("hallo")));
        let empfangen = rx.try_recv().expect("Nachricht muss vorhanden sein");
        let wert: serde_json::Value = serde_json::from_str(&empfangen.als_text()).unwrap();
        assert_eq!(wert["text"], "hallo");
    }

    #[tokio::test]
    async fn broadcast_mit_ausschluss() {
        let registry = ConnectionRegistry::neu();
        let raum = RoomId::from("ABC123");
        let cid1 = ConnectionId::neu();
        let cid2 = ConnectionId::neu();

        let mut rx1 = registry.registrieren(&raum, cid1, usize::MAX).expect("unter dem Limit");
        let mut rx2 = registry.registrieren(&raum, cid2, usize::MAX).expect("unter dem Limit");

        let gesendet = registry.an_raum_senden(&raum, test_nachricht("x"), Some(&cid1));
        assert_eq!(gesendet, 1);
        assert!(rx1.try_recv().is_err(), "Ausloeser darf nichts empfangen");
        assert!(rx2.try_recv().is_ok());
    }

    #[tokio::test]
    async fn broadcast_erreicht_nur_den_eigenen_raum() {
        let registry = ConnectionRegistry::neu();
        let raum_a = RoomId::from("RAUMAA");
        let raum_b = RoomId::from("RAUMBB");
        let cid_a = ConnectionId::neu();
        let cid_b = ConnectionId::neu();

        let mut rx_a = registry.registrieren(&raum_a, cid_a, usize::MAX).expect("unter dem Limit");
        let mut rx_b = registry.registrieren(&raum_b, cid_b, usize::MAX).expect("unter dem Limit");

        registry.an_raum_senden(&raum_a, test_nachricht("nur a"), None);
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn toter_kanal_wird_beim_broadcast_entfernt() {
        let registry = ConnectionRegistry::neu();
        let raum = RoomId::from("ABC123");
        let cid_tot = ConnectionId::neu();
        let cid_lebt = ConnectionId::neu();

        let rx_tot = registry.registrieren(&raum, cid_tot, usize::MAX).expect("unter dem Limit");
        let mut rx_lebt = registry.registrieren(&raum, cid_lebt, usize::MAX).expect("unter dem Limit");
        drop(rx_tot); // Empfaenger weg -> Queue geschlossen

        let gesendet = registry.an_raum_senden(&raum, test_nachricht("x"), None);
        assert_eq!(gesendet, 1, "lebender Kanal wird weiterhin beliefert");
        assert!(rx_lebt.try_recv().is_ok());

        // Lazy-Cleanup hat den toten Kanal entfernt
        assert!(!registry.ist_registriert(&cid_tot));
        assert_eq!(registry.verbindungs_anzahl(&raum), 1);
    }

    #[tokio::test]
    async fn leerer_raum_eintrag_wird_geloescht() {
        let registry = ConnectionRegistry::neu();
        let raum = RoomId::from("ABC123");
        let cid = ConnectionId::neu();

        let _rx = registry.registrieren(&raum, cid, usize::MAX).expect("unter dem Limit");
        assert!(registry.raum_hat_kanaele(&raum));

        registry.entfernen(&raum, &cid);
        assert!(!registry.raum_hat_kanaele(&raum), "Eintrag selbst muss weg sein");
        assert_eq!(registry.verbindungs_anzahl(&raum), 0);
    }

    #[tokio::test]
    async fn doppelte_registrierung_ist_noop_fuer_die_menge() {
        let registry = ConnectionRegistry::neu();
        let raum = RoomId::from("ABC123");
        let cid = ConnectionId::neu();

        let _rx1 = registry.registrieren(&raum, cid, usize::MAX).expect("unter dem Limit");
        let _rx2 = registry.registrieren(&raum, cid, usize::MAX).expect("unter dem Limit");
        assert_eq!(registry.verbindungs_anzahl(&raum), 1);
    }

    #[tokio::test]
    async fn zulassungs_keys_werden_mit_dem_kanal_entfernt() {
        let registry = ConnectionRegistry::neu();
        let raum = RoomId::from("ABC123");
        let cid = ConnectionId::neu();

        let _rx = registry.registrieren(&raum, cid, usize::MAX).expect("unter dem Limit");
        assert!(registry
            .zulassungs_key_setzen(&raum, "1.2.3.4#alice".into(), cid)
            .is_none());

        registry.entfernen(&raum, &cid);
        // erneutes Setzen desselben Keys darf keinen alten Eintrag treffen
        let cid2 = ConnectionId::neu();
        let _rx2 = registry.registrieren(&raum, cid2, usize::MAX).expect("unter dem Limit");
        assert!(
            registry
                .zulassungs_key_setzen(&raum, "1.2.3.4#alice".into(), cid2)
                .is_none(),
            "entfernter Kanal darf nicht als Vorgaenger gemeldet werden"
        );
        assert_eq!(registry.verbindungs_anzahl(&raum), 1);
    }

    #[tokio::test]
    async fn doppelter_zulassungs_key_meldet_den_vorgaenger() {
        let registry = ConnectionRegistry::neu();
        let raum = RoomId::from("ABC123");
        let cid_alt = ConnectionId::neu();
        let cid_neu = ConnectionId::neu();

        let _rx_alt = registry.registrieren(&raum, cid_alt, usize::MAX).expect("unter dem Limit");
        assert!(registry
            .zulassungs_key_setzen(&raum, "1.2.3.4#alice".into(), cid_alt)
            .is_none());

        let _rx_neu = registry.registrieren(&raum, cid_neu, usize::MAX).expect("unter dem Limit");
        let verdraengt = registry.zulassungs_key_setzen(&raum, "1.2.3.4#alice".into(), cid_neu);
        assert_eq!(verdraengt, Some(cid_alt));
    }

    #[tokio::test]
    async fn identitaet_anderweitig_verbunden_sieht_nur_fremde_kanaele() {
        let registry = ConnectionRegistry::neu();
        let raum = RoomId::from("ABC123");
        let pid = ParticipantId::from("alice");
        let cid1 = ConnectionId::neu();
        let cid2 = ConnectionId::neu();

        let _rx1 = registry.registrieren(&raum, cid1, usize::MAX).expect("unter dem Limit");
        registry.identitaet_setzen(&cid1, pid.clone());
        assert!(!registry.identitaet_anderweitig_verbunden(&cid1, &pid));

        let _rx2 = registry.registrieren(&raum, cid2, usize::MAX).expect("unter dem Limit");
        registry.identitaet_setzen(&cid2, pid.clone());
        assert!(registry.identitaet_anderweitig_verbunden(&cid1, &pid));

        registry.entfernen(&raum, &cid2);
        assert!(!registry.identitaet_anderweitig_verbunden(&cid1, &pid));
    }

    #[tokio::test]
    async fn registrierung_am_limit_wird_abgewiesen() {
        let registry = ConnectionRegistry::neu();
        let raum = RoomId::from("ABC123");
        let cid1 = ConnectionId::neu();
        let cid2 = ConnectionId::neu();
        let cid3 = ConnectionId::neu();

        let _rx1 = registry.registrieren(&raum, cid1, 2).expect("unter dem Limit");
        let _rx2 = registry.registrieren(&raum, cid2, 2).expect("unter dem Limit");
        assert!(registry.registrieren(&raum, cid3, 2).is_none());

        // Abgewiesene Kanaele hinterlassen keine Spuren
        assert!(!registry.ist_registriert(&cid3));
        assert_eq!(registry.verbindungs_anzahl(&raum), 2);

        // Ein bereits enthaltener Kanal bleibt auch am Limit idempotent
        assert!(registry.registrieren(&raum, cid1, 2).is_some());
        assert_eq!(registry.verbindungs_anzahl(&raum), 2);
    }
}
