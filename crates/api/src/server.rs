//! Axum HTTP-Server fuer die Schluessel-API

use std::net::SocketAddr;

use anyhow::Result;
use axum::http::{HeaderValue, Method};
use axum::{middleware, Router};
use draugar_observability::{health_router, http_metriken, HealthState};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::{routes::api_router, ApiState};

/// Pfad des Health-Endpunkts der API
pub const HEALTH_PFAD: &str = "/api/health";

/// REST-Server-Konfiguration
#[derive(Debug, Clone)]
pub struct RestServerKonfig {
    pub bind_addr: SocketAddr,
    /// Erlaubte CORS-Origins. Leer = alle Origins erlaubt (nur fuer Entwicklung).
    pub cors_origins: Vec<String>,
}

impl Default for RestServerKonfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            cors_origins: vec![],
        }
    }
}

/// Axum HTTP-Server fuer die Schluessel-API
pub struct RestServer {
    konfig: RestServerKonfig,
}

impl RestServer {
    pub fn neu(konfig: RestServerKonfig) -> Self {
        Self { konfig }
    }

    fn cors(&self) -> CorsLayer {
        if self.konfig.cors_origins.is_empty() {
            return CorsLayer::permissive();
        }
        let origins: Vec<HeaderValue> = self
            .konfig
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    }

    /// Baut den vollstaendigen Router inklusive Layern
    pub fn router(&self, state: ApiState, health: HealthState) -> Router {
        let metriken = state.metriken.clone();
        let mut app = api_router()
            .with_state(state)
            .merge(health_router(HEALTH_PFAD, health));

        if let Some(metriken) = metriken {
            app = app.layer(middleware::from_fn_with_state(metriken, http_metriken));
        }

        app.layer(TraceLayer::new_for_http()).layer(self.cors())
    }

    /// Bindet den Socket und bedient Anfragen bis `shutdown_rx` auf `true` wechselt
    pub async fn starten(
        self,
        state: ApiState,
        health: HealthState,
        shutdown_rx: tokio::sync::watch::Receiver<bool>,
    ) -> Result<()> {
        let listener = TcpListener::bind(self.konfig.bind_addr).await?;
        self.starten_mit_listener(listener, state, health, shutdown_rx)
            .await
    }

    /// Wie [`Self::starten`], mit bereits gebundenem Listener
    pub async fn starten_mit_listener(
        self,
        listener: TcpListener,
        state: ApiState,
        health: HealthState,
        mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
    ) -> Result<()> {
        let app = self.router(state, health);
        tracing::info!(addr = %listener.local_addr()?, "REST-Server gestartet");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                while shutdown_rx.changed().await.is_ok() {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                }
            })
            .await?;

        tracing::info!("REST-Server gestoppt");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
