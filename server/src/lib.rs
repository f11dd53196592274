//! podium-server – Bibliotheks-Root
//!
//! Deklariert die Server-Module und stellt den oeffentlichen
//! Einstiegspunkt fuer Integrationstests bereit.

pub mod collab;
pub mod config;

use anyhow::Result;
use axum::Router;
use config::ServerConfig;
use podium_signaling::{web, SignalingConfig, SignalingState};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::collab::{EingebauterCoach, FlagMetrik, SpeicherReportStore};

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Baut den Signaling-Zustand mit den eingebauten Mitspielern zusammen
    pub fn state_erstellen(&self) -> Arc<SignalingState> {
        SignalingState::neu(
            SignalingConfig {
                verbindungs_limit_pro_raum: self.config.raum.verbindungs_limit,
                vorbereitungszeit_sek: self.config.raum.vorbereitungszeit_sek,
            },
            Arc::new(EingebauterCoach::neu()),
            Arc::new(SpeicherReportStore::neu()),
            Arc::new(FlagMetrik::neu()),
        )
    }

    /// Startet den HTTP/WebSocket-Server und laeuft bis zum Shutdown-Signal
    pub async fn starten(self) -> Result<()> {
        let state = self.state_erstellen();
        let router: Router = web::router(state);

        let adresse = self.config.bind_adresse();
        let listener = tokio::net::TcpListener::bind(&adresse).await?;

        tracing::info!(
            server_name = %self.config.server.name,
            adresse = %adresse,
            "Server startet"
        );

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        tracing::info!("Server beendet");
        Ok(())
    }
}

/// Wartet auf Ctrl-C
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(fehler = %err, "Shutdown-Signal nicht verfuegbar");
    } else {
        tracing::info!("Shutdown-Signal empfangen, Server wird beendet");
    }
}
