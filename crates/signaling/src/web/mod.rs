//! HTTP-Oberflaeche des Signaling-Kerns
//!
//! Axum-Router mit Raum-Verwaltung, WebSocket-Upgrade und den
//! Weiterleitungen an die externen Mitspieler (Coaching, Reports,
//! Metriken). CORS ist permissiv, Request-Tracing laeuft ueber
//! `TraceLayer`.

pub mod collab;
pub mod rooms;
pub mod ws;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::server_state::SignalingState;

/// Erstellt den vollstaendigen Router
pub fn router(state: Arc<SignalingState>) -> Router {
    Router::new()
        // Raeume
        .route("/api/rooms", post(rooms::raum_erstellen))
        .route("/api/rooms", get(rooms::raeume_auflisten))
        .route("/api/rooms/:id", get(rooms::raum_abrufen))
        .route("/api/rooms/:id/join-check", get(rooms::beitritt_pruefen))
        // Signaling
        .route("/ws/:room_id", get(ws::signaling_upgrade))
        .route("/ws/coach", get(ws::coach_upgrade))
        // Externe Mitspieler
        .route("/api/reports", post(collab::report_speichern))
        .route("/api/stats", get(collab::stats_abrufen))
        .route("/api/metrics/health", get(collab::metrik_health))
        .route("/api/metrics/start", post(collab::metrik_starten))
        .route("/api/metrics/stop", post(collab::metrik_stoppen))
        // Betrieb
        .route("/health", get(rooms::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
