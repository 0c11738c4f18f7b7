//! draugar-server – Bibliotheks-Root
//!
//! Verdrahtet Schluessel-API, Echtzeit-Relay und Observability zu einem
//! Prozess und stellt den Einstiegspunkt fuer Integrationstests bereit.

pub mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use config::ServerConfig;
use draugar_api::{ApiState, RestServer, RestServerKonfig};
use draugar_auth::AuthService;
use draugar_crypto::CryptoContext;
use draugar_db::InMemoryStore;
use draugar_keys::KeyService;
use draugar_observability::{observability_server_starten, DraugarMetrics, HealthState};
use draugar_signaling::{RealtimeServer, SignalingState};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Haelt den Server-Zustand vor dem Start zusammen
pub struct Server {
    pub config: ServerConfig,
}

/// Gebundener, laufender Server
///
/// Die Adressen sind die tatsaechlich gebundenen (Port 0 wird aufgeloest).
pub struct LaufenderServer {
    pub api_addr: SocketAddr,
    pub realtime_addr: SocketAddr,
    pub auth_service: AuthService,
    pub signaling: Arc<SignalingState>,
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<(&'static str, JoinHandle<Result<()>>)>,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet alle Subsysteme und laeuft bis Ctrl-C
    pub async fn starten(self) -> Result<()> {
        let laufend = self.binden().await?;
        tracing::info!(
            api = %laufend.api_url(),
            realtime = %laufend.realtime_addr,
            "Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)..."
        );
        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutdown-Signal empfangen, Server wird beendet");
        laufend.beenden().await
    }

    /// Bindet alle Listener und startet die Subsysteme als Tasks
    ///
    /// Ohne Token-Secret startet der Server nicht.
    pub async fn binden(self) -> Result<LaufenderServer> {
        let config = self.config;
        config.validieren()?;

        let secret = config.auth.secret_aufloesen()?;
        let auth_service = AuthService::neu(secret)
            .context("Token-Secret unbrauchbar")?
            .mit_lebensdauer_tagen(config.auth.token_lebensdauer_tage);

        let metriken = DraugarMetrics::neu()?;
        let health = HealthState::neu();

        // Gruppe und Mitglieder leben im selben Speicher
        let speicher = Arc::new(InMemoryStore::neu());
        let key_service = KeyService::neu(CryptoContext::neu()?, speicher.clone(), speicher);

        let api_state = ApiState::neu(key_service, auth_service.clone(), Some(metriken.clone()));
        let signaling = SignalingState::neu(
            config.realtime.signaling_config(),
            auth_service.clone(),
            Some(metriken.clone()),
        );

        let api_listener = TcpListener::bind(config.api_bind_adresse())
            .await
            .with_context(|| format!("API-Port {} nicht bindbar", config.api_bind_adresse()))?;
        let realtime_listener = TcpListener::bind(config.realtime_bind_adresse())
            .await
            .with_context(|| {
                format!("Echtzeit-Port {} nicht bindbar", config.realtime_bind_adresse())
            })?;
        let api_addr = api_listener.local_addr()?;
        let realtime_addr = realtime_listener.local_addr()?;
        if !config.nur_lokal() {
            tracing::warn!(
                bind_adresse = %config.netzwerk.bind_adresse,
                "Ports ohne TLS oeffentlich gebunden; TLS-terminierenden Proxy vorschalten"
            );
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut tasks: Vec<(&'static str, JoinHandle<Result<()>>)> = Vec::new();

        let rest = RestServer::neu(RestServerKonfig {
            bind_addr: api_addr,
            cors_origins: config.api.cors_origins.clone(),
        });
        tasks.push((
            "api",
            tokio::spawn(rest.starten_mit_listener(
                api_listener,
                api_state,
                health.clone(),
                shutdown_rx.clone(),
            )),
        ));

        let realtime = RealtimeServer::neu(Arc::clone(&signaling), realtime_addr);
        let rx = shutdown_rx.clone();
        tasks.push((
            "realtime",
            tokio::spawn(async move {
                realtime
                    .starten_mit_listener(realtime_listener, rx)
                    .await
                    .map_err(anyhow::Error::from)
            }),
        ));

        if config.observability.aktiviert {
            let addr: SocketAddr = config
                .observability_bind_adresse()
                .parse()
                .context("Observability-Adresse ungueltig")?;
            tasks.push((
                "observability",
                tokio::spawn(observability_server_starten(
                    addr,
                    metriken,
                    health,
                    shutdown_rx,
                )),
            ));
        }

        tracing::info!(
            server_name = %config.server.name,
            api = %api_addr,
            realtime = %realtime_addr,
            observability = config.observability.aktiviert,
            "Server gestartet"
        );

        Ok(LaufenderServer {
            api_addr,
            realtime_addr,
            auth_service,
            signaling,
            shutdown_tx,
            tasks,
        })
    }
}

impl LaufenderServer {
    /// Basis-URL der Schluessel-API
    pub fn api_url(&self) -> String {
        format!("http://{}", self.api_addr)
    }

    /// Signalisiert Shutdown und wartet auf alle Subsysteme
    pub async fn beenden(self) -> Result<()> {
        let _ = self.shutdown_tx.send(true);
        let mut erster_fehler = None;
        for (name, task) in self.tasks {
            match task.await {
                Ok(Ok(())) => tracing::debug!(subsystem = name, "Subsystem beendet"),
                Ok(Err(e)) => {
                    tracing::error!(subsystem = name, fehler = %e, "Subsystem mit Fehler beendet");
                    erster_fehler.get_or_insert(e);
                }
                Err(e) => {
                    tracing::error!(subsystem = name, fehler = %e, "Subsystem-Task abgebrochen");
                    erster_fehler.get_or_insert(anyhow::Error::from(e));
                }
            }
        }
        match erster_fehler {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
