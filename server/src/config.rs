//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist. Einzige Ausnahme ist das Token-Secret.

use anyhow::{bail, Result};
use draugar_observability::logging::{log_format_gueltig, log_level_gueltig};
use draugar_signaling::SignalingConfig;
use serde::{Deserialize, Serialize};

/// Umgebungsvariable mit dem Pfad der Konfigurationsdatei
pub const CONFIG_ENV: &str = "DRAUGAR_CONFIG";

/// Umgebungsvariable fuer das Token-Secret (hat Vorrang vor der Datei)
pub const TOKEN_SECRET_ENV: &str = "DRAUGAR_TOKEN_SECRET";

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server: ServerEinstellungen,
    pub netzwerk: NetzwerkEinstellungen,
    pub auth: AuthEinstellungen,
    /// Echtzeit-Relay
    pub realtime: RealtimeEinstellungen,
    pub logging: LoggingEinstellungen,
    /// Metriken und Health
    pub observability: ObservabilityEinstellungen,
    /// Schluessel-API (HTTP)
    pub api: ApiEinstellungen,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Anzeigename des Servers (nur fuer Logs)
    pub name: String,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            name: "Draugar".into(),
        }
    }
}

/// Bind-Adresse und Ports
///
/// API und Echtzeit-Relay sprechen Klartext (HTTP bzw. TCP), das Token
/// reist im ersten Frame mit. Ausserhalb eines vertrauenswuerdigen Netzes
/// gehoert ein TLS-terminierender Proxy davor und `bind_adresse` auf
/// `127.0.0.1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    pub bind_adresse: String,
    /// Port der Schluessel-API
    pub api_port: u16,
    /// Port des Echtzeit-Relays
    pub realtime_port: u16,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            api_port: 3000,
            realtime_port: 3001,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthEinstellungen {
    /// HMAC-Secret fuer Identitaets-Tokens (mindestens 32 Bytes)
    pub token_secret: Option<String>,
    pub token_lebensdauer_tage: i64,
}

impl Default for AuthEinstellungen {
    fn default() -> Self {
        Self {
            token_secret: None,
            token_lebensdauer_tage: draugar_auth::STANDARD_LEBENSDAUER_TAGE,
        }
    }
}

impl std::fmt::Debug for AuthEinstellungen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthEinstellungen")
            .field("token_secret", &self.token_secret.as_ref().map(|_| "[REDACTED]"))
            .field("token_lebensdauer_tage", &self.token_lebensdauer_tage)
            .finish()
    }
}

impl AuthEinstellungen {
    /// Secret aus `DRAUGAR_TOKEN_SECRET` oder der Datei
    pub fn secret_aufloesen(&self) -> Result<String> {
        Self::secret_waehlen(std::env::var(TOKEN_SECRET_ENV).ok(), self.token_secret.clone())
    }

    fn secret_waehlen(aus_env: Option<String>, aus_datei: Option<String>) -> Result<String> {
        match aus_env.or(aus_datei).filter(|s| !s.is_empty()) {
            Some(secret) => Ok(secret),
            None => bail!(
                "Kein Token-Secret konfiguriert: {TOKEN_SECRET_ENV} oder [auth].token_secret setzen"
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeEinstellungen {
    pub keepalive_sek: u64,
    pub verbindungs_timeout_sek: u64,
    pub handshake_timeout_sek: u64,
    pub send_queue_groesse: usize,
    pub max_verbindungen: usize,
    pub max_frame_groesse: usize,
}

impl Default for RealtimeEinstellungen {
    fn default() -> Self {
        let standard = SignalingConfig::default();
        Self {
            keepalive_sek: standard.keepalive_sek,
            verbindungs_timeout_sek: standard.verbindungs_timeout_sek,
            handshake_timeout_sek: standard.handshake_timeout_sek,
            send_queue_groesse: standard.send_queue_groesse,
            max_verbindungen: standard.max_verbindungen,
            max_frame_groesse: standard.max_frame_groesse,
        }
    }
}

impl RealtimeEinstellungen {
    pub fn signaling_config(&self) -> SignalingConfig {
        SignalingConfig {
            keepalive_sek: self.keepalive_sek,
            verbindungs_timeout_sek: self.verbindungs_timeout_sek,
            handshake_timeout_sek: self.handshake_timeout_sek,
            send_queue_groesse: self.send_queue_groesse,
            max_verbindungen: self.max_verbindungen,
            max_frame_groesse: self.max_frame_groesse,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityEinstellungen {
    /// Aktiviert den Observability-Server
    pub aktiviert: bool,
    /// Port fuer Metriken und Health (Standard: 9300)
    pub port: u16,
}

impl Default for ObservabilityEinstellungen {
    fn default() -> Self {
        Self {
            aktiviert: true,
            port: 9300,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiEinstellungen {
    /// CORS-Origins (leer = alle erlaubt)
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> Result<Self> {
        let config: Self = match std::fs::read_to_string(pfad) {
            Ok(inhalt) => toml::from_str(&inhalt)
                .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Self::default()
            }
            Err(e) => bail!("Konfigurationsdatei '{pfad}' nicht lesbar: {e}"),
        };
        config.validieren()?;
        Ok(config)
    }

    /// Prueft Werte, die serde allein nicht abfangen kann
    pub fn validieren(&self) -> Result<()> {
        if !log_level_gueltig(&self.logging.level) {
            bail!("Ungueltiges Log-Level: '{}'", self.logging.level);
        }
        if !log_format_gueltig(&self.logging.format) {
            bail!("Ungueltiges Log-Format: '{}'", self.logging.format);
        }
        if !(1..=draugar_auth::MAX_LEBENSDAUER_TAGE).contains(&self.auth.token_lebensdauer_tage) {
            bail!(
                "token_lebensdauer_tage muss zwischen 1 und {} liegen",
                draugar_auth::MAX_LEBENSDAUER_TAGE
            );
        }
        let rt = &self.realtime;
        if rt.keepalive_sek == 0 || rt.handshake_timeout_sek == 0 {
            bail!("keepalive_sek und handshake_timeout_sek muessen positiv sein");
        }
        if rt.verbindungs_timeout_sek <= rt.keepalive_sek {
            bail!("verbindungs_timeout_sek muss groesser als keepalive_sek sein");
        }
        if rt.send_queue_groesse == 0 || rt.max_frame_groesse == 0 {
            bail!("send_queue_groesse und max_frame_groesse muessen positiv sein");
        }
        Ok(())
    }

    /// Ob nur lokal gebunden wird (hinter einem Proxy)
    pub fn nur_lokal(&self) -> bool {
        self.netzwerk
            .bind_adresse
            .parse::<std::net::IpAddr>()
            .is_ok_and(|ip| ip.is_loopback())
            || self.netzwerk.bind_adresse == "localhost"
    }

    pub fn api_bind_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.bind_adresse, self.netzwerk.api_port)
    }

    pub fn realtime_bind_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.bind_adresse, self.netzwerk.realtime_port)
    }

    pub fn observability_bind_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.bind_adresse, self.observability.port)
    }
}
