//! # draugar-observability
//!
//! Observability-Crate fuer Draugar:
//! - Prometheus-kompatible Metriken (`/metrics`)
//! - Health-Check-Endpunkt
//! - Structured Logging via tracing-subscriber
//! - Request-Metriken Middleware

pub mod health;
pub mod logging;
pub mod metrics;
pub mod middleware;

pub use health::{health_handler, health_router, HealthResponse, HealthState};
pub use logging::logging_initialisieren;
pub use metrics::{metrics_router, DraugarMetrics};
pub use middleware::http_metriken;

use anyhow::Result;
use std::net::SocketAddr;

/// Startet den Observability-HTTP-Server (Metriken + Health)
///
/// Endpunkte:
/// - `GET /metrics` – Prometheus scrape format
/// - `GET /health`  – Health-Check JSON
///
/// Laeuft bis `shutdown_rx` auf `true` wechselt.
pub async fn observability_server_starten(
    bind_addr: SocketAddr,
    metriken: DraugarMetrics,
    health: HealthState,
    mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
) -> Result<()> {
    let app = metrics_router(metriken).merge(health_router("/health", health));

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(addr = %bind_addr, "Observability-Server gestartet");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            while shutdown_rx.changed().await.is_ok() {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
        })
        .await?;
    Ok(())
}
