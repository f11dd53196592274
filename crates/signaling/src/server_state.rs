//! Gemeinsamer Server-Zustand fuer den Signaling-Kern
//!
//! Haelt Registry, Room-Store und die externen Mitspieler als
//! Arc-Referenzen, die sicher zwischen tokio-Tasks geteilt werden
//! koennen. Kein ambienter globaler Zustand: der State wird beim Start
//! erstellt und explizit in alle Komponenten gereicht, Tests bauen
//! sich eine frische Instanz.

use podium_core::collab::{FeedbackGenerator, MetricsControl, ReportStore};
use std::sync::Arc;
use std::time::Instant;

use crate::broadcast::ConnectionRegistry;
use crate::rooms::RoomStore;

/// Konfiguration fuer den Signaling-Kern
#[derive(Debug, Clone)]
pub struct SignalingConfig {
    /// Festes Anti-Missbrauch-Limit gleichzeitiger Verbindungen pro
    /// Raum – unabhaengig von der konfigurierten `max_participants`
    /// des Raums
    pub verbindungs_limit_pro_raum: usize,
    /// Vorbereitungszeit in Sekunden, bei Sitzungsstart in den Raum
    /// geschrieben
    pub vorbereitungszeit_sek: u32,
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            verbindungs_limit_pro_raum: 10,
            vorbereitungszeit_sek: 60,
        }
    }
}

/// Gemeinsamer Server-Zustand (thread-safe, Arc-geteilt)
pub struct SignalingState {
    /// Kern-Konfiguration
    pub config: Arc<SignalingConfig>,
    /// Registry der lebenden Kanaele
    pub registry: ConnectionRegistry,
    /// Autoritativer Raum-Zustand
    pub rooms: RoomStore,
    /// LLM-Coaching (opak, potenziell langsam – nie unter Raum-Sperre rufen)
    pub feedback_generator: Arc<dyn FeedbackGenerator>,
    /// Dauerhafter Report-Speicher
    pub report_store: Arc<dyn ReportStore>,
    /// Kontrolle ueber den Metrik-/Visualisierungsprozess
    pub metrics: Arc<dyn MetricsControl>,
    /// Startzeitpunkt (fuer Uptime)
    pub start_time: Instant,
}

impl SignalingState {
    /// Erstellt einen neuen SignalingState
    pub fn neu(
        config: SignalingConfig,
        feedback_generator: Arc<dyn FeedbackGenerator>,
        report_store: Arc<dyn ReportStore>,
        metrics: Arc<dyn MetricsControl>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config: Arc::new(config),
            registry: ConnectionRegistry::neu(),
            rooms: RoomStore::neu(),
            feedback_generator,
            report_store,
            metrics,
            start_time: Instant::now(),
        })
    }

    /// Gibt die Uptime in Sekunden zurueck
    pub fn uptime_sek(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
