//! Eingebaute Implementierungen der externen Mitspieler
//!
//! Podium laeuft auch ohne LLM-Backend, Datenbank oder
//! Metrik-Prozess: der Coach antwortet mit eingebauten Zeilen, Reports
//! liegen im Speicher, die Metrik-Kontrolle ist ein Flag. Externe
//! Backends lassen sich ueber dieselben Traits einhaengen.

use async_trait::async_trait;
use parking_lot::Mutex;
use podium_core::collab::{
    AggregateStats, FeedbackGenerator, MetricsControl, ReportStore, SessionSummary,
};
use podium_core::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

// ---------------------------------------------------------------------------
// Coach mit eingebauten Antworten
// ---------------------------------------------------------------------------

/// Feedback-Generator ohne externes Backend
///
/// Waehlt deterministisch eine Coaching-Zeile anhand der Eingabelaenge,
/// damit derselbe Input dieselbe Antwort bekommt.
pub struct EingebauterCoach {
    zeilen: Vec<&'static str>,
}

impl EingebauterCoach {
    pub fn neu() -> Self {
        Self {
            zeilen: vec![
                "Starker Einstieg! Versuche, deine Kernaussage noch frueher zu nennen.",
                "Gut strukturiert. Mehr Pausen wuerden deinen Argumenten Gewicht geben.",
                "Deine Beispiele sind anschaulich. Achte auf ein ruhigeres Sprechtempo.",
                "Ueberzeugender Schluss! Der Mittelteil koennte noch gestrafft werden.",
            ],
        }
    }
}

impl Default for EingebauterCoach {
    fn default() -> Self {
        Self::neu()
    }
}

#[async_trait]
impl FeedbackGenerator for EingebauterCoach {
    async fn generate_feedback(&self, input: &str) -> Result<String> {
        let index = input.chars().count() % self.zeilen.len();
        Ok(self.zeilen[index].to_string())
    }
}

// ---------------------------------------------------------------------------
// In-Memory-Report-Store
// ---------------------------------------------------------------------------

/// Append-Only-Speicher fuer Sitzungszusammenfassungen im Prozess
#[derive(Default)]
pub struct SpeicherReportStore {
    reports: Mutex<Vec<SessionSummary>>,
}

impl SpeicherReportStore {
    pub fn neu() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReportStore for SpeicherReportStore {
    async fn save_report(&self, summary: SessionSummary) -> Result<()> {
        self.reports.lock().push(summary);
        Ok(())
    }

    async fn load_stats(&self) -> Result<AggregateStats> {
        let reports = self.reports.lock();
        let total_sessions = reports.len() as u64;
        let total_speaking_secs: u64 = reports
            .iter()
            .map(|r| u64::from(r.speaking_duration_secs))
            .sum();
        let average_score = if reports.is_empty() {
            0.0
        } else {
            reports.iter().map(|r| f64::from(r.overall_score)).sum::<f64>()
                / reports.len() as f64
        };
        Ok(AggregateStats {
            total_sessions,
            total_speaking_secs,
            average_score,
        })
    }
}

// ---------------------------------------------------------------------------
// Flag-basierte Metrik-Kontrolle
// ---------------------------------------------------------------------------

/// Metrik-Kontrolle ohne echten Unterprozess
///
/// Start und Stop schalten nur das Liveness-Flag; der eigentliche
/// Visualisierungsdienst laeuft als eigenstaendiger Prozess ausserhalb
/// dieses Servers.
#[derive(Default)]
pub struct FlagMetrik {
    laeuft: AtomicBool,
}

impl FlagMetrik {
    pub fn neu() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetricsControl for FlagMetrik {
    async fn start(&self) -> Result<()> {
        if !self.laeuft.swap(true, Ordering::SeqCst) {
            info!("Metrik-Dienst gestartet");
        }
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        if self.laeuft.swap(false, Ordering::SeqCst) {
            info!("Metrik-Dienst gestoppt");
        }
        Ok(())
    }

    async fn is_alive(&self) -> bool {
        self.laeuft.load(Ordering::SeqCst)
    }
}
