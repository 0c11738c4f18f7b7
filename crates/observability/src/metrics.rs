//! Prometheus-kompatible Metriken fuer Draugar
//!
//! Registrierte Metriken:
//! - `draugar_connected_clients` – Gauge: Authentifizierte Echtzeit-Verbindungen
//! - `draugar_location_broadcasts_total` – Counter: Weitergeleitete Standort-Updates
//! - `draugar_broadcast_dropped_total` – Counter: Wegen voller Queue verworfene Nachrichten
//! - `draugar_handshake_rejected_total` – Counter: Abgelehnte Handshakes
//! - `draugar_group_keys_issued_total` – Counter: Ausgegebene Schluessel-Pakete (operation)
//! - `draugar_http_requests_total` – Counter: HTTP-Anfragen (method, path, status)
//! - `draugar_http_request_duration_seconds` – Histogram: HTTP-Antwortzeit

use anyhow::Result;
use axum::{extract::State, response::IntoResponse, routing::get, Router};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

/// Alle Draugar-Prometheus-Metriken
#[derive(Clone)]
pub struct DraugarMetrics {
    pub registry: Arc<Registry>,

    // Echtzeit
    pub connected_clients: IntGauge,
    pub location_broadcasts_total: IntCounter,
    pub broadcast_dropped_total: IntCounter,
    pub handshake_rejected_total: IntCounter,

    // Schluessel-API
    pub group_keys_issued_total: IntCounterVec,

    // HTTP
    pub http_requests_total: IntCounterVec,
    pub http_request_duration_seconds: HistogramVec,
}

impl DraugarMetrics {
    /// Erstellt und registriert alle Metriken in einer neuen Registry
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        let connected_clients = IntGauge::with_opts(Opts::new(
            "draugar_connected_clients",
            "Anzahl authentifizierter Echtzeit-Verbindungen",
        ))?;
        registry.register(Box::new(connected_clients.clone()))?;

        let location_broadcasts_total = IntCounter::with_opts(Opts::new(
            "draugar_location_broadcasts_total",
            "Gesamtanzahl weitergeleiteter Standort-Updates",
        ))?;
        registry.register(Box::new(location_broadcasts_total.clone()))?;

        let broadcast_dropped_total = IntCounter::with_opts(Opts::new(
            "draugar_broadcast_dropped_total",
            "Wegen voller Send-Queue verworfene Nachrichten",
        ))?;
        registry.register(Box::new(broadcast_dropped_total.clone()))?;

        let handshake_rejected_total = IntCounter::with_opts(Opts::new(
            "draugar_handshake_rejected_total",
            "Abgelehnte Echtzeit-Handshakes",
        ))?;
        registry.register(Box::new(handshake_rejected_total.clone()))?;

        let group_keys_issued_total = IntCounterVec::new(
            Opts::new(
                "draugar_group_keys_issued_total",
                "Ausgegebene Gruppen-Schluessel-Pakete",
            ),
            &["operation"],
        )?;
        registry.register(Box::new(group_keys_issued_total.clone()))?;

        let http_requests_total = IntCounterVec::new(
            Opts::new("draugar_http_requests_total", "Gesamtanzahl HTTP-Anfragen"),
            &["method", "path", "status"],
        )?;
        registry.register(Box::new(http_requests_total.clone()))?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "draugar_http_request_duration_seconds",
                "HTTP-Antwortzeit in Sekunden",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
            ]),
            &["method", "path"],
        )?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            connected_clients,
            location_broadcasts_total,
            broadcast_dropped_total,
            handshake_rejected_total,
            group_keys_issued_total,
            http_requests_total,
            http_request_duration_seconds,
        })
    }

    /// Exportiert alle Metriken im Prometheus-Textformat
    pub fn exportieren(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Axum-Router fuer den `/metrics`-Endpunkt
pub fn metrics_router(metriken: DraugarMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metriken)
}

async fn metrics_handler(State(metriken): State<DraugarMetrics>) -> impl IntoResponse {
    match metriken.exportieren() {
        Ok(text) => (
            axum::http::StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4",
            )],
            text,
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Metriken-Export fehlgeschlagen: {err}");
            axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[test]
    fn metriken_erstellen_erfolgreich() {
        let metriken = DraugarMetrics::neu().unwrap();
        assert!(!metriken.registry.gather().is_empty());
    }

    #[test]
    fn gauge_connected_clients() {
        let metriken = DraugarMetrics::neu().unwrap();
        metriken.connected_clients.inc();
        metriken.connected_clients.inc();
        metriken.connected_clients.dec();
        assert_eq!(metriken.connected_clients.get(), 1);
    }

    #[test]
    fn schluessel_counter_mit_labels() {
        let metriken = DraugarMetrics::neu().unwrap();
        metriken
            .group_keys_issued_total
            .with_label_values(&["register"])
            .inc();
        assert_eq!(
            metriken
                .group_keys_issued_total
                .with_label_values(&["register"])
                .get(),
            1
        );
        assert_eq!(
            metriken
                .group_keys_issued_total
                .with_label_values(&["fetch"])
                .get(),
            0
        );
    }

    #[test]
    fn metriken_export_prometheus_format() {
        let metriken = DraugarMetrics::neu().unwrap();
        metriken.connected_clients.set(5);
        metriken.location_broadcasts_total.inc();

        let output = metriken.exportieren().unwrap();
        assert!(output.contains("draugar_connected_clients 5"));
        assert!(output.contains("draugar_location_broadcasts_total 1"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[tokio::test]
    async fn metrics_endpunkt_liefert_text() {
        let metriken = DraugarMetrics::neu().unwrap();
        metriken.handshake_rejected_total.inc();

        let antwort = metrics_router(metriken)
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(antwort.status(), axum::http::StatusCode::OK);

        let body = axum::body::to_bytes(antwort.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("draugar_handshake_rejected_total 1"));
    }
}
